//! Apple IIe キーボードインターフェース
//!
//! ホストのキーイベントをキーボードラッチと修飾キーフラグに変換する。
//! Resetが効くのはControlが押されている間だけ。

use crate::memory::Memory;

/// システムキー（印字可能文字以外）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysKey {
    Shift,
    OpenApple,
    FilledApple,
    Control,
    Left,
    Right,
    Up,
    Down,
    Reset,
    Escape,
    Return,
    Delete,
}

/// キーボードの状態
pub struct Keyboard {
    ctrl_down: bool,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard { ctrl_down: false }
    }

    /// 印字可能文字の打鍵。7ビットにマスクしてラッチへ
    pub fn key_type(&self, mem: &mut Memory, key: u8) {
        mem.key_down(key & 0x7F);
    }

    /// システムキーの押下。Ctrl+Resetが成立したらtrueを返し、
    /// 呼び出し側がCPUリセットを実行する
    #[must_use]
    pub fn sys_key_down(&mut self, mem: &mut Memory, key: SysKey) -> bool {
        match key {
            SysKey::Shift => mem.set_shift(true),
            SysKey::OpenApple => mem.set_open_apple(true),
            SysKey::FilledApple => mem.set_filled_apple(true),
            SysKey::Control => self.ctrl_down = true,
            SysKey::Reset => return self.ctrl_down,
            SysKey::Left => self.key_type(mem, 0x08),
            SysKey::Right => self.key_type(mem, 0x15),
            SysKey::Up => self.key_type(mem, 0x0B),
            SysKey::Down => self.key_type(mem, 0x0A),
            SysKey::Escape => self.key_type(mem, 0x1B),
            SysKey::Return => self.key_type(mem, 0x0D),
            SysKey::Delete => self.key_type(mem, 0x7F),
        }
        false
    }

    /// システムキーの解放
    pub fn sys_key_up(&mut self, mem: &mut Memory, key: SysKey) {
        match key {
            SysKey::Shift => mem.set_shift(false),
            SysKey::OpenApple => mem.set_open_apple(false),
            SysKey::FilledApple => mem.set_filled_apple(false),
            SysKey::Control => self.ctrl_down = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_masks_to_7bit() {
        let kbd = Keyboard::new();
        let mut mem = Memory::new();
        kbd.key_type(&mut mem, 0xC1);
        assert_eq!(mem.keyboard_latch, 0xC1); // 0x41 | 0x80
    }

    #[test]
    fn test_reset_requires_control() {
        let mut kbd = Keyboard::new();
        let mut mem = Memory::new();
        assert!(!kbd.sys_key_down(&mut mem, SysKey::Reset));
        assert!(!kbd.sys_key_down(&mut mem, SysKey::Control));
        assert!(kbd.sys_key_down(&mut mem, SysKey::Reset));
        kbd.sys_key_up(&mut mem, SysKey::Control);
        assert!(!kbd.sys_key_down(&mut mem, SysKey::Reset));
    }

    #[test]
    fn test_modifier_flags() {
        let mut kbd = Keyboard::new();
        let mut mem = Memory::new();
        let _ = kbd.sys_key_down(&mut mem, SysKey::Shift);
        let _ = kbd.sys_key_down(&mut mem, SysKey::OpenApple);
        assert!(mem.switches.shift);
        assert!(mem.switches.open_apple);
        kbd.sys_key_up(&mut mem, SysKey::Shift);
        assert!(!mem.switches.shift);
    }

    #[test]
    fn test_arrow_keys_map_to_control_codes() {
        let mut kbd = Keyboard::new();
        let mut mem = Memory::new();
        let _ = kbd.sys_key_down(&mut mem, SysKey::Left);
        assert_eq!(mem.keyboard_latch, 0x08 | 0x80);
    }
}
