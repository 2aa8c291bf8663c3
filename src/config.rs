//! 設定ファイル管理モジュール
//!
//! エミュレータの設定をJSON形式で永続化

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 設定ファイルのデフォルトパス
const CONFIG_FILE: &str = "a2pie_config.json";

/// エミュレータ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 最後に使用したディスク1のパス
    pub last_disk1: Option<String>,
    /// 最後に使用したディスク2のパス
    pub last_disk2: Option<String>,
    /// ウィンドウ拡大率（1または2）
    pub scale: usize,
    /// カラー表示（falseでモノクロ）
    pub color_display: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            last_disk1: None,
            last_disk2: None,
            scale: 1,
            color_display: true,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込む。なければデフォルト
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// 指定したパスから設定を読み込む
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config: {}, using defaults", e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// 設定ファイルを保存する
    pub fn save(&self) -> Result<(), String> {
        self.save_to(CONFIG_FILE)
    }

    /// 指定したパスに設定を保存する
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write config: {}", e))?;
        Ok(())
    }
}
