//! Apple II Disk II コントローラエミュレーション
//!
//! Disk II hardware emulation based on "Beneath Apple DOS" documentation
//!
//! $C0E0-$C0EFの16個のソフトスイッチを実装する。偶数アドレスがオフ、
//! 奇数アドレスがオンの対になっている（ステッパーフェーズ対 E0-E7 と
//! Q6/Q7対 EC-EF を除く）。書き込みモードは未実装で、書き込まれた
//! データは捨てられる。

use crate::bus::Bus;
use crate::diskette::{Diskette, TRACK_NIBBLES, TRACKS};

/// Disk IIコントローラカード（2ドライブ）
pub struct DiskController {
    /// モーターオン
    motor_on: bool,
    /// ドライブ2が選択されているか
    drive2: bool,
    /// ステッパーモーターの現在フェーズ（0-3）
    phase: usize,
    /// ヘッドのある現在トラック（0-34）
    track: usize,
    /// トラック内の読み取り位置（0-6655）
    pos: usize,
    /// Q6制御ビット（シフト/ロード）
    q6: bool,
    /// Q7制御ビット（読み取り/書き込み）
    q7: bool,
    /// データラッチ
    latch: u8,
    /// 各ドライブのディスケット
    disks: [Option<Diskette>; 2],
}

impl Default for DiskController {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskController {
    pub fn new() -> Self {
        DiskController {
            motor_on: false,
            drive2: false,
            phase: 0,
            track: 0,
            pos: 0,
            q6: false,
            q7: false,
            latch: 0,
            disks: [None, None],
        }
    }

    /// コントローラをリセット。ヘッド位置（フェーズ/トラック）は保持する
    pub fn reset(&mut self, bus: &mut Bus) {
        self.latch = 0;
        self.q6 = false;
        self.q7 = false;
        self.drive2 = false;
        self.motor_on = false;
        bus.set_fast_mode(false);
    }

    /// ディスケットを挿入する
    pub fn insert_disk(&mut self, drive: usize, disk: Diskette) -> Result<(), String> {
        if drive > 1 {
            return Err(format!("invalid drive number: {}", drive));
        }
        self.disks[drive] = Some(disk);
        log::info!("Disk inserted in drive {}", drive + 1);
        Ok(())
    }

    /// ディスケットを取り出す
    pub fn eject_disk(&mut self, drive: usize) {
        if drive <= 1 {
            self.disks[drive] = None;
        }
    }

    /// ドライブLEDが点灯しているか。点灯するのは選択中ドライブのみ
    pub fn led_on(&self, drive2: bool) -> bool {
        if drive2 != self.drive2 {
            return false;
        }
        self.motor_on
    }

    /// ヘッドのある現在トラック
    pub fn track(&self) -> usize {
        self.track
    }

    /// トラック内の現在読み取り位置
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    fn any_disk_inserted(&self) -> bool {
        self.disks.iter().any(|d| d.is_some())
    }

    /// ステッパーフェーズの点灯
    ///
    /// 2相ステッピングモーターの近似: 直前のフェーズから時計回りに
    /// 1つ進んだらトラック+1、反時計回りならトラック-1。それ以外の
    /// 遷移ではヘッドは動かない。トラックは[0, 34]にクランプされる。
    fn phase_change(&mut self, new_phase: usize) {
        if self.phase == (new_phase + 3) & 3 {
            if self.track < TRACKS - 1 {
                self.track += 1;
            }
        } else if self.phase == (new_phase + 1) & 3 {
            if self.track > 0 {
                self.track -= 1;
            }
        }
        self.phase = new_phase;
    }

    /// 読み取りパルス: ラッチを次のニブルで埋める
    ///
    /// シフト/読み取りモード（Q6=Q7=0）でモーターが回っていて、選択中
    /// ドライブにディスクがある場合のみ読み進む。それ以外はラッチ0。
    fn update_data(&mut self) {
        self.latch = 0;
        if !self.q6 && !self.q7 && self.motor_on {
            let drive = self.drive2 as usize;
            if let Some(disk) = &self.disks[drive] {
                self.latch = disk.tracks[self.track][self.pos];
                self.pos += 1;
                if self.pos == TRACK_NIBBLES {
                    self.pos = 0;
                }
            }
        }
    }

    /// バスのアドレス線が$C0E0-$C0EFに変化したときの処理
    pub fn bus_update(&mut self, bus: &mut Bus) {
        bus.data = 0;
        match bus.addr {
            // フェーズオフは無視してよい
            0xC0E0 => {}
            0xC0E1 => self.phase_change(0),
            0xC0E2 => bus.data = self.latch,
            0xC0E3 => self.phase_change(1),
            0xC0E4 => bus.data = self.latch,
            0xC0E5 => self.phase_change(2),
            0xC0E6 => bus.data = self.latch,
            0xC0E7 => self.phase_change(3),
            0xC0E8 => {
                // モーターオフ。速度制限も元に戻す
                bus.set_fast_mode(false);
                bus.data = self.latch;
                self.motor_on = false;
            }
            0xC0E9 => {
                // モーターオン。ディスクが入っていればフルスピードで回す
                if self.any_disk_inserted() {
                    bus.set_fast_mode(true);
                }
                self.motor_on = true;
            }
            0xC0EA => {
                bus.data = self.latch;
                self.drive2 = false;
            }
            0xC0EB => self.drive2 = true,
            0xC0EC => {
                bus.data = self.latch;
                self.update_data();
                self.q6 = false;
            }
            0xC0ED => self.q6 = true,
            0xC0EE => self.q7 = false,
            0xC0EF => self.q7 = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Bus, Device};
    use crate::diskette::DSK_SIZE;

    fn test_diskette() -> Diskette {
        Diskette::from_dsk(&vec![0u8; DSK_SIZE]).unwrap()
    }

    fn controller_on_bus(with_disk: bool) -> Bus {
        let mut disk = DiskController::new();
        if with_disk {
            disk.insert_disk(0, test_diskette()).unwrap();
        }
        let mut bus = Bus::new();
        bus.attach(Device::Disk(disk), 0xC0E0, 0xC0EF);
        bus
    }

    fn touch(bus: &mut Bus, addr: u16) {
        bus.set(Some(addr), None, Some(true));
    }

    #[test]
    fn test_stepper_seek_in() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9); // モーターオン
        touch(&mut bus, 0xC0E3); // フェーズ1: 0→1で+1
        touch(&mut bus, 0xC0E5); // フェーズ2: +1
        touch(&mut bus, 0xC0E7); // フェーズ3: +1
        assert_eq!(bus.disk().unwrap().track(), 3);
        // 逆回転で1つ戻る
        touch(&mut bus, 0xC0E5);
        assert_eq!(bus.disk().unwrap().track(), 2);
    }

    #[test]
    fn test_stepper_wraparound_transitions() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        // 0→3は反時計回り: トラック0でクランプ
        touch(&mut bus, 0xC0E7);
        assert_eq!(bus.disk().unwrap().track(), 0);
        // 3→0は時計回り: +1
        touch(&mut bus, 0xC0E1);
        assert_eq!(bus.disk().unwrap().track(), 1);
    }

    #[test]
    fn test_stepper_nonadjacent_phase_is_ignored() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        touch(&mut bus, 0xC0E5); // 0→2: 対向フェーズ、ヘッドは動かない
        assert_eq!(bus.disk().unwrap().track(), 0);
        // 同一フェーズの再点灯も動かない
        touch(&mut bus, 0xC0E5);
        assert_eq!(bus.disk().unwrap().track(), 0);
    }

    #[test]
    fn test_stepper_clamps_at_top_track() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        // 34を超えて進めても張り付く
        for _ in 0..20 {
            touch(&mut bus, 0xC0E3);
            touch(&mut bus, 0xC0E5);
            touch(&mut bus, 0xC0E7);
            touch(&mut bus, 0xC0E1);
        }
        assert_eq!(bus.disk().unwrap().track(), 34);
    }

    #[test]
    fn test_motor_controls_fast_mode() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        assert!(bus.fast_mode());
        touch(&mut bus, 0xC0E8);
        assert!(!bus.fast_mode());

        // ディスクが入っていなければモーターオンでも速度制限は残す
        let mut empty = controller_on_bus(false);
        touch(&mut empty, 0xC0E9);
        assert!(!empty.fast_mode());
        assert!(empty.disk().unwrap().motor_on());
    }

    #[test]
    fn test_read_pulse_streams_nibbles() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        // 最初の読み取りはラッチの初期値0が出て、裏でニブルが装填される
        touch(&mut bus, 0xC0EC);
        assert_eq!(bus.data(), 0x00);
        // 以後はトラック先頭の同期バイト（FF）が順に出てくる
        touch(&mut bus, 0xC0EC);
        assert_eq!(bus.data(), 0xFF);
        assert_eq!(bus.disk().unwrap().position(), 2);
    }

    #[test]
    fn test_read_pulse_wraps_at_track_end() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        for _ in 0..TRACK_NIBBLES {
            touch(&mut bus, 0xC0EC);
        }
        assert_eq!(bus.disk().unwrap().position(), 0);
    }

    #[test]
    fn test_no_read_when_motor_off_or_q_latched() {
        let mut bus = controller_on_bus(true);
        // モーターオフ: ラッチは0のまま、位置も進まない
        touch(&mut bus, 0xC0EC);
        touch(&mut bus, 0xC0EC);
        assert_eq!(bus.data(), 0x00);
        assert_eq!(bus.disk().unwrap().position(), 0);

        // Q7（書き込みモード）中も読み進まない
        touch(&mut bus, 0xC0E9);
        touch(&mut bus, 0xC0EF);
        touch(&mut bus, 0xC0EC);
        assert_eq!(bus.disk().unwrap().position(), 0);
        touch(&mut bus, 0xC0EE); // 読み取りモードに戻す
        touch(&mut bus, 0xC0EC);
        assert_eq!(bus.disk().unwrap().position(), 1);
    }

    #[test]
    fn test_drive_select_and_led() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        assert!(bus.disk().unwrap().led_on(false));
        assert!(!bus.disk().unwrap().led_on(true));
        touch(&mut bus, 0xC0EB); // ドライブ2選択
        assert!(!bus.disk().unwrap().led_on(false));
        assert!(bus.disk().unwrap().led_on(true));
        // ドライブ2にはディスクがないので読み出しは空
        touch(&mut bus, 0xC0EC);
        touch(&mut bus, 0xC0EC);
        assert_eq!(bus.data(), 0x00);
    }

    #[test]
    fn test_reset_clears_control_state() {
        let mut bus = controller_on_bus(true);
        touch(&mut bus, 0xC0E9);
        touch(&mut bus, 0xC0EB);
        touch(&mut bus, 0xC0ED);
        touch(&mut bus, 0xC0E3);
        bus.reset();
        let disk = bus.disk().unwrap();
        assert!(!disk.motor_on());
        assert!(!disk.led_on(true));
        // ヘッド位置は保持される
        assert_eq!(disk.track(), 1);
        assert!(!bus.fast_mode());
    }
}
