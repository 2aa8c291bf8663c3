//! A2PIE - Apple IIe Emulator Library
//!
//! Version 0.1
//!
//! バス、CPU、メモリ、ディスク、ビデオの各エミュレーションモジュールを提供
//!
//! - MOS 6502 CPU（テーブル駆動、サイクルカウント付き）
//! - Apple IIe バンク切り替えメモリとソフトスイッチ
//! - Disk II コントローラと6-and-2ニブルエンコーダ
//! - テキスト / Lo-Res / Hi-Res / Double Hi-Res ビデオ

pub mod bus;
pub mod cpu;
pub mod memory;
pub mod diskette;
pub mod disk;
pub mod video;
pub mod keyboard;
pub mod apple2;
pub mod config;
