//! Apple IIe マシン統合
//!
//! バス、CPU、メモリ、ディスクコントローラを1台のマシンに組み上げ、
//! NTSCフレーム単位の実行ループを提供する。

use crate::bus::{Bus, Device};
use crate::cpu::Cpu;
use crate::disk::DiskController;
use crate::diskette::Diskette;
use crate::keyboard::{Keyboard, SysKey};
use crate::memory::{GpuMemory, Memory};

/// NTSC 1フレームぶんのCPUサイクル数（262ライン × 65サイクル）
pub const CYCLES_PER_FRAME: u64 = 17030;
/// フレーム先頭からVBLANKが立っているサイクル数
const VBLANK_CYCLES: u64 = 4550;

/// Apple IIeエミュレータ本体
pub struct Apple2 {
    pub cpu: Cpu,
    pub bus: Bus,
    keyboard: Keyboard,
}

impl Apple2 {
    /// ROMイメージからマシンを組み立てる
    ///
    /// デバイスの登録順が重要: ディスクを先に、メモリを全域デフォルトと
    /// して後に登録する。重なった$C0E0-$C0EFではディスクの通知が後に
    /// 走り、そのデータ書き込みが勝つ。
    pub fn new(system_rom: &[u8], boot_rom: &[u8]) -> Result<Self, String> {
        let mut memory = Memory::new();
        memory.load_rom(system_rom)?;
        memory.load_boot_rom(boot_rom)?;

        let mut bus = Bus::new();
        bus.attach(Device::Disk(DiskController::new()), 0xC0E0, 0xC0EF);
        bus.attach(Device::Memory(memory), 0x0000, 0xFFFF);

        Ok(Apple2 {
            cpu: Cpu::new(),
            bus,
            keyboard: Keyboard::new(),
        })
    }

    /// マシン全体をリセット（CPU経由でバス上の全デバイスに伝播）
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
    }

    /// 1フレームぶん実行する。フレーム先頭の4,550サイクルはVBLANK
    pub fn run_frame(&mut self) -> u64 {
        let mut elapsed: u64 = 0;
        let mut vblank = true;
        self.set_vblank(true);
        while elapsed <= CYCLES_PER_FRAME {
            elapsed += self.cpu.tick(&mut self.bus) as u64;
            let in_vblank = elapsed <= VBLANK_CYCLES;
            if in_vblank != vblank {
                vblank = in_vblank;
                self.set_vblank(in_vblank);
            }
        }
        elapsed
    }

    /// 指定サイクル数だけ実行する（ヘッドレス/テスト用）
    pub fn run_cycles(&mut self, cycles: u64) {
        let start = self.cpu.cycle_count();
        while self.cpu.cycle_count() - start < cycles {
            self.cpu.tick(&mut self.bus);
        }
    }

    fn set_vblank(&mut self, on: bool) {
        if let Some(mem) = self.bus.memory_mut() {
            mem.switches.vblank = on;
        }
    }

    /// 印字可能文字の打鍵
    pub fn key_type(&mut self, key: u8) {
        if let Some(mem) = self.bus.memory_mut() {
            self.keyboard.key_type(mem, key);
        }
    }

    /// システムキーの押下。Ctrl+Resetはここでマシンリセットになる
    pub fn sys_key_down(&mut self, key: SysKey) {
        let reset = match self.bus.memory_mut() {
            Some(mem) => self.keyboard.sys_key_down(mem, key),
            None => false,
        };
        if reset {
            self.reset();
        }
    }

    /// システムキーの解放
    pub fn sys_key_up(&mut self, key: SysKey) {
        if let Some(mem) = self.bus.memory_mut() {
            self.keyboard.sys_key_up(mem, key);
        }
    }

    /// .DSKイメージをドライブに挿入する
    pub fn insert_disk(&mut self, drive: usize, data: &[u8]) -> Result<(), String> {
        let diskette = Diskette::from_dsk(data)?;
        match self.bus.disk_mut() {
            Some(disk) => disk.insert_disk(drive, diskette),
            None => Err("no disk controller on the bus".to_string()),
        }
    }

    /// ディスクモーター回転中（速度制限を外すべきか）
    pub fn fast_mode(&self) -> bool {
        self.bus.fast_mode()
    }

    /// ドライブLEDの状態
    pub fn drive_led(&self, drive2: bool) -> bool {
        self.bus.disk().map(|d| d.led_on(drive2)).unwrap_or(false)
    }

    /// ビデオへ渡す表示ページのスナップショット
    pub fn gpu_memory(&self) -> Option<GpuMemory<'_>> {
        self.bus.memory().map(|mem| mem.gpu_memory())
    }
}
