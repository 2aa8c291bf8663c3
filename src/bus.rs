//! Apple IIe システムバス
//!
//! アドレス / データ / R/W の各ラインをラッチし、アドレス線の変化を
//! 登録済みデバイスへ通知する。デバイスの登録は先頭挿入なので、
//! 通知は逆登録順に走り、最後に実行されたデバイス（＝最初に登録された
//! デバイス）のデータ書き込みが勝つ。Memory を全域 $0000-$FFFF の
//! デフォルトとして最後に登録し、I/O デバイスが特定ページを上書きする。

use crate::disk::DiskController;
use crate::memory::Memory;

/// バスに接続されるデバイス
///
/// ホットパスなので trait object ではなく enum + match で静的ディスパッチする
pub enum Device {
    Memory(Memory),
    Disk(DiskController),
}

impl Device {
    fn bus_update(&mut self, bus: &mut Bus) {
        match self {
            Device::Memory(m) => m.bus_update(bus),
            Device::Disk(d) => d.bus_update(bus),
        }
    }

    fn reset(&mut self, bus: &mut Bus) {
        match self {
            Device::Memory(m) => m.reset(),
            Device::Disk(d) => d.reset(bus),
        }
    }
}

/// デバイスの担当アドレス範囲（両端含む）
#[derive(Debug, Clone, Copy)]
struct DeviceRange {
    slot: usize,
    start: u16,
    end: u16,
}

/// バスの現在の状態
pub struct Bus {
    /// アドレスライン
    pub addr: u16,
    /// データライン
    pub data: u8,
    /// R/W ライン（true = 読み出し）
    pub read: bool,
    /// エミュレーション速度制限を外すヒント（ディスクモーター回転中）
    fast_mode: bool,
    ranges: Vec<DeviceRange>,
    slots: Vec<Option<Device>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Bus {
            addr: 0,
            data: 0,
            read: true,
            fast_mode: false,
            ranges: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// デバイスを指定アドレス範囲で登録する
    ///
    /// 登録順が意味を持つ。範囲が重なる場合、先に登録したデバイスが
    /// 後から通知されるため、そのデータ書き込みが最終的に残る。
    pub fn attach(&mut self, device: Device, start: u16, end: u16) {
        assert!(
            end >= start,
            "bus device range end (${:04X}) must be >= start (${:04X})",
            end,
            start
        );
        self.slots.push(Some(device));
        let range = DeviceRange {
            slot: self.slots.len() - 1,
            start,
            end,
        };
        self.ranges.insert(0, range);
    }

    /// バスラインを更新する。None のラインは現状維持。
    ///
    /// アドレスが与えられた場合のみ、範囲の一致する全デバイスに
    /// bus_update を通知する。
    pub fn set(&mut self, addr: Option<u16>, data: Option<u8>, read: Option<bool>) {
        if let Some(d) = data {
            self.data = d;
        }
        if let Some(r) = read {
            self.read = r;
        }
        if let Some(a) = addr {
            self.addr = a;
            for i in 0..self.ranges.len() {
                let range = self.ranges[i];
                if a >= range.start && a <= range.end {
                    if let Some(mut device) = self.slots[range.slot].take() {
                        device.bus_update(self);
                        self.slots[range.slot] = Some(device);
                    }
                }
            }
        }
    }

    /// データラインの現在値
    pub fn data(&self) -> u8 {
        self.data
    }

    /// CPU リセットに合わせて全デバイスをリセットする
    pub fn reset(&mut self) {
        self.fast_mode = false;
        for slot in 0..self.slots.len() {
            if let Some(mut device) = self.slots[slot].take() {
                device.reset(self);
                self.slots[slot] = Some(device);
            }
        }
    }

    pub fn set_fast_mode(&mut self, mode: bool) {
        self.fast_mode = mode;
    }

    pub fn fast_mode(&self) -> bool {
        self.fast_mode
    }

    pub fn memory(&self) -> Option<&Memory> {
        self.slots.iter().find_map(|slot| match slot {
            Some(Device::Memory(m)) => Some(m),
            _ => None,
        })
    }

    pub fn memory_mut(&mut self) -> Option<&mut Memory> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Some(Device::Memory(m)) => Some(m),
            _ => None,
        })
    }

    pub fn disk(&self) -> Option<&DiskController> {
        self.slots.iter().find_map(|slot| match slot {
            Some(Device::Disk(d)) => Some(d),
            _ => None,
        })
    }

    pub fn disk_mut(&mut self) -> Option<&mut DiskController> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Some(Device::Disk(d)) => Some(d),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with_memory() -> Bus {
        let mut bus = Bus::new();
        bus.attach(Device::Memory(Memory::new()), 0x0000, 0xFFFF);
        bus
    }

    #[test]
    fn test_lines_latch_without_dispatch() {
        let mut bus = bus_with_memory();
        // アドレスなしの set はラインを更新するだけでデバイスに触れない
        bus.set(None, Some(0x42), Some(false));
        assert_eq!(bus.data(), 0x42);
        assert!(!bus.read);
    }

    #[test]
    fn test_memory_read_write_roundtrip() {
        let mut bus = bus_with_memory();
        bus.set(Some(0x0300), Some(0x5A), Some(false));
        bus.set(Some(0x0300), None, Some(true));
        assert_eq!(bus.data(), 0x5A);
    }

    #[test]
    fn test_fast_mode_cleared_on_reset() {
        let mut bus = bus_with_memory();
        bus.set_fast_mode(true);
        assert!(bus.fast_mode());
        bus.reset();
        assert!(!bus.fast_mode());
    }

    #[test]
    #[should_panic(expected = "must be >= start")]
    fn test_attach_rejects_inverted_range() {
        let mut bus = Bus::new();
        bus.attach(Device::Memory(Memory::new()), 0xC100, 0xC000);
    }
}
