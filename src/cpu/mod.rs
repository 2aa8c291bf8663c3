//! MOS 6502 CPU エミュレーション
//!
//! Apple IIe に搭載される NMOS 6502 のテーブル駆動インタプリタ。
//! Based on 6502 technical specifications and datasheet
//!
//! 256エントリのアドレッシングモード / 命令長 / サイクル数テーブルで
//! 命令をデコードし、実効アドレスを内部ラッチ al に解決してから
//! オペコードごとのハンドラへディスパッチする。

mod opcodes;

use crate::bus::Bus;

/// 割り込みベクタ
pub const VEC_NMI: u16 = 0xFFFA;
pub const VEC_RESET: u16 = 0xFFFC;
pub const VEC_IRQ: u16 = 0xFFFE;

/// ステータスレジスタのフラグビット
pub mod flags {
    pub const CARRY: u8 = 1;            // C: キャリーフラグ
    pub const ZERO: u8 = 1 << 1;        // Z: ゼロフラグ
    pub const IRQ_DISABLE: u8 = 1 << 2; // I: 割り込み禁止フラグ
    pub const DECIMAL: u8 = 1 << 3;     // D: BCDモード（ADC/SBCでは無視）
    pub const BREAK: u8 = 1 << 4;       // B: スタックに積まれるコピーのみセット
    pub const UNUSED: u8 = 1 << 5;      // 未使用（常に1）
    pub const OVERFLOW: u8 = 1 << 6;    // V: オーバーフローフラグ
    pub const NEGATIVE: u8 = 1 << 7;    // N: 負数フラグ
}

// アドレッシングモード番号（instruction_modes テーブルの値）
const MODE_ABSOLUTE: u8 = 1;
const MODE_ABSOLUTE_X: u8 = 2;
const MODE_ABSOLUTE_Y: u8 = 3;
const MODE_ACCUMULATOR: u8 = 4;
const MODE_IMMEDIATE: u8 = 5;
const MODE_IMPLIED: u8 = 6;
const MODE_INDEXED_INDIRECT: u8 = 7;
const MODE_INDIRECT: u8 = 8;
const MODE_INDIRECT_INDEXED: u8 = 9;
const MODE_RELATIVE: u8 = 10;
const MODE_ZERO_PAGE: u8 = 11;
const MODE_ZERO_PAGE_X: u8 = 12;
const MODE_ZERO_PAGE_Y: u8 = 13;

/// 各オペコードのアドレッシングモード
const INSTRUCTION_MODES: [u8; 256] = [
    6, 7, 6, 7, 11, 11, 11, 11, 6, 5, 4, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 12, 12, 6, 3, 6, 3, 2, 2, 2, 2,
    1, 7, 6, 7, 11, 11, 11, 11, 6, 5, 4, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 12, 12, 6, 3, 6, 3, 2, 2, 2, 2,
    6, 7, 6, 7, 11, 11, 11, 11, 6, 5, 4, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 12, 12, 6, 3, 6, 3, 2, 2, 2, 2,
    6, 7, 6, 7, 11, 11, 11, 11, 6, 5, 4, 5, 8, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 12, 12, 6, 3, 6, 3, 2, 2, 2, 2,
    5, 7, 5, 7, 11, 11, 11, 11, 6, 5, 6, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 13, 13, 6, 3, 6, 3, 2, 2, 3, 3,
    5, 7, 5, 7, 11, 11, 11, 11, 6, 5, 6, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 13, 13, 6, 3, 6, 3, 2, 2, 3, 3,
    5, 7, 5, 7, 11, 11, 11, 11, 6, 5, 6, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 12, 12, 6, 3, 6, 3, 2, 2, 2, 2,
    5, 7, 5, 7, 11, 11, 11, 11, 6, 5, 6, 5, 1, 1, 1, 1,
    10, 9, 6, 9, 12, 12, 12, 12, 6, 3, 6, 3, 2, 2, 2, 2,
];

/// 各オペコードの命令長（バイト数）
const INSTRUCTION_SIZES: [u8; 256] = [
    2, 2, 0, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
    3, 2, 0, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
    1, 2, 0, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
    1, 2, 0, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 0, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 0, 3, 0, 0,
    2, 2, 2, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 2, 1, 0, 3, 3, 3, 0,
    2, 2, 0, 0, 2, 2, 2, 0, 1, 3, 1, 0, 3, 3, 3, 0,
];

/// 各オペコードの基本サイクル数（条件付き追加分を除く）
const INSTRUCTION_CYCLES: [u8; 256] = [
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
    2, 6, 2, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5,
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
    2, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4,
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
];

/// ページ境界をまたいだ場合の追加サイクル数
const INSTRUCTION_PAGE_CYCLES: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, 1, 1, 1, 1,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0,
];

/// 各オペコードのニーモニック（トレース出力用）
const INSTRUCTION_NAMES: [&str; 256] = [
    "BRK", "ORA", "KIL", "SLO", "NOP", "ORA", "ASL", "SLO",
    "PHP", "ORA", "ASL", "ANC", "NOP", "ORA", "ASL", "SLO",
    "BPL", "ORA", "KIL", "SLO", "NOP", "ORA", "ASL", "SLO",
    "CLC", "ORA", "NOP", "SLO", "NOP", "ORA", "ASL", "SLO",
    "JSR", "AND", "KIL", "RLA", "BIT", "AND", "ROL", "RLA",
    "PLP", "AND", "ROL", "ANC", "BIT", "AND", "ROL", "RLA",
    "BMI", "AND", "KIL", "RLA", "NOP", "AND", "ROL", "RLA",
    "SEC", "AND", "NOP", "RLA", "NOP", "AND", "ROL", "RLA",
    "RTI", "EOR", "KIL", "SRE", "NOP", "EOR", "LSR", "SRE",
    "PHA", "EOR", "LSR", "ALR", "JMP", "EOR", "LSR", "SRE",
    "BVC", "EOR", "KIL", "SRE", "NOP", "EOR", "LSR", "SRE",
    "CLI", "EOR", "NOP", "SRE", "NOP", "EOR", "LSR", "SRE",
    "RTS", "ADC", "KIL", "RRA", "NOP", "ADC", "ROR", "RRA",
    "PLA", "ADC", "ROR", "ARR", "JMP", "ADC", "ROR", "RRA",
    "BVS", "ADC", "KIL", "RRA", "NOP", "ADC", "ROR", "RRA",
    "SEI", "ADC", "NOP", "RRA", "NOP", "ADC", "ROR", "RRA",
    "NOP", "STA", "NOP", "SAX", "STY", "STA", "STX", "SAX",
    "DEY", "NOP", "TXA", "XAA", "STY", "STA", "STX", "SAX",
    "BCC", "STA", "KIL", "AHX", "STY", "STA", "STX", "SAX",
    "TYA", "STA", "TXS", "TAS", "SHY", "STA", "SHX", "AHX",
    "LDY", "LDA", "LDX", "LAX", "LDY", "LDA", "LDX", "LAX",
    "TAY", "LDA", "TAX", "LAX", "LDY", "LDA", "LDX", "LAX",
    "BCS", "LDA", "KIL", "LAX", "LDY", "LDA", "LDX", "LAX",
    "CLV", "LDA", "TSX", "LAS", "LDY", "LDA", "LDX", "LAX",
    "CPY", "CMP", "NOP", "DCP", "CPY", "CMP", "DEC", "DCP",
    "INY", "CMP", "DEX", "AXS", "CPY", "CMP", "DEC", "DCP",
    "BNE", "CMP", "KIL", "DCP", "NOP", "CMP", "DEC", "DCP",
    "CLD", "CMP", "NOP", "DCP", "NOP", "CMP", "DEC", "DCP",
    "CPX", "SBC", "NOP", "ISC", "CPX", "SBC", "INC", "ISC",
    "INX", "SBC", "NOP", "SBC", "CPX", "SBC", "INC", "ISC",
    "BEQ", "SBC", "KIL", "ISC", "NOP", "SBC", "INC", "ISC",
    "SED", "SBC", "NOP", "ISC", "NOP", "SBC", "INC", "ISC",
];

/// CPUレジスタの状態
#[derive(Debug, Clone)]
pub struct Registers {
    /// プログラムカウンタ
    pub pc: u16,
    /// アキュムレータ
    pub a: u8,
    /// Xインデックスレジスタ
    pub x: u8,
    /// Yインデックスレジスタ
    pub y: u8,
    /// スタックポインタ
    pub sp: u8,
    /// ステータスレジスタ
    pub status: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            pc: 0,
            a: 0,
            x: 0,
            y: 0,
            // リセット時は3バイト分の空ポップが起きるので $FD から始まる
            sp: 0xFD,
            status: flags::IRQ_DISABLE | flags::UNUSED,
        }
    }
}

/// 6502 CPU
pub struct Cpu {
    /// CPUレジスタ
    pub regs: Registers,
    /// 累積サイクル数（単調増加、リセットでもクリアしない）
    cycle_count: u64,
    /// 実効アドレスラッチ。アドレッシングモード解決と命令実行の間で
    /// 実効アドレスを受け渡す
    al: u16,
    /// IRQライン（配線のみ、ディスパッチは行わない）
    pub irq_line: bool,
    /// NMIライン（配線のみ）
    pub nmi_line: bool,
    /// 命令トレース出力
    pub trace: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

fn pages_differ(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::default(),
            cycle_count: 0,
            al: 0,
            irq_line: false,
            nmi_line: false,
            trace: false,
        }
    }

    /// 累積サイクル数を取得
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// CPUをリセットし、バス上の全デバイスにもリセットを伝える
    pub fn reset(&mut self, bus: &mut Bus) {
        self.regs.a = 0;
        self.regs.x = 0;
        self.regs.y = 0;
        // 割り込みはデフォルトで禁止
        self.regs.status = flags::IRQ_DISABLE | flags::UNUSED;
        self.regs.sp = 0xFD;
        // リセットベクタからPCをロード
        self.regs.pc = self.read16(bus, VEC_RESET);

        bus.reset();
    }

    /// 1命令を実行し、消費したサイクル数を返す
    pub fn tick(&mut self, bus: &mut Bus) -> u32 {
        if self.trace {
            self.print_instruction(bus, self.regs.pc);
        }
        let pc = self.regs.pc;
        let opcode = self.read8(bus, pc);

        // アドレッシングモードを解決して実効アドレスを al に入れる
        let mut paged = false;
        match INSTRUCTION_MODES[opcode as usize] {
            MODE_ABSOLUTE => {
                self.al = self.read16(bus, pc.wrapping_add(1));
            }
            MODE_ABSOLUTE_X => {
                self.al = self
                    .read16(bus, pc.wrapping_add(1))
                    .wrapping_add(self.regs.x as u16);
                paged = pages_differ(self.al.wrapping_sub(self.regs.x as u16), self.al);
            }
            MODE_ABSOLUTE_Y => {
                self.al = self
                    .read16(bus, pc.wrapping_add(1))
                    .wrapping_add(self.regs.y as u16);
                paged = pages_differ(self.al.wrapping_sub(self.regs.y as u16), self.al);
            }
            MODE_ACCUMULATOR | MODE_IMPLIED => {
                self.al = 0;
            }
            MODE_IMMEDIATE => {
                self.al = pc.wrapping_add(1);
            }
            MODE_INDEXED_INDIRECT => {
                let zp = self.read8(bus, pc.wrapping_add(1)).wrapping_add(self.regs.x);
                self.al = self.read16_nowrap(bus, zp as u16);
            }
            MODE_INDIRECT => {
                let ptr = self.read16(bus, pc.wrapping_add(1));
                self.al = self.read16_nowrap(bus, ptr);
            }
            MODE_INDIRECT_INDEXED => {
                let zp = self.read8(bus, pc.wrapping_add(1)) as u16;
                self.al = self
                    .read16_nowrap(bus, zp)
                    .wrapping_add(self.regs.y as u16);
                paged = pages_differ(self.al.wrapping_sub(self.regs.y as u16), self.al);
            }
            MODE_RELATIVE => {
                let offset = self.read8(bus, pc.wrapping_add(1)) as i8;
                self.al = pc.wrapping_add(2).wrapping_add(offset as u16);
            }
            MODE_ZERO_PAGE => {
                self.al = self.read8(bus, pc.wrapping_add(1)) as u16;
            }
            MODE_ZERO_PAGE_X => {
                self.al = self.read8(bus, pc.wrapping_add(1)).wrapping_add(self.regs.x) as u16;
            }
            MODE_ZERO_PAGE_Y => {
                self.al = self.read8(bus, pc.wrapping_add(1)).wrapping_add(self.regs.y) as u16;
            }
            _ => {}
        }

        self.regs.pc = self
            .regs
            .pc
            .wrapping_add(INSTRUCTION_SIZES[opcode as usize] as u16);
        let before = self.cycle_count;
        self.cycle_count += INSTRUCTION_CYCLES[opcode as usize] as u64;
        if paged {
            self.cycle_count += INSTRUCTION_PAGE_CYCLES[opcode as usize] as u64;
        }

        self.execute(bus, opcode);

        (self.cycle_count - before) as u32
    }

    /// トレース出力（PC、命令バイト、ニーモニック、レジスタ状態）
    fn print_instruction(&mut self, bus: &mut Bus, pc: u16) {
        let opcode = self.read8(bus, pc);
        let size = INSTRUCTION_SIZES[opcode as usize];
        let name = INSTRUCTION_NAMES[opcode as usize];
        let b1 = if size >= 2 {
            format!("{:02X}", self.read8(bus, pc.wrapping_add(1)))
        } else {
            "  ".to_string()
        };
        let b2 = if size >= 3 {
            format!("{:02X}", self.read8(bus, pc.wrapping_add(2)))
        } else {
            "  ".to_string()
        };
        println!(
            "{:04X}  {:02X} {} {}  {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc, opcode, b1, b2, name,
            self.regs.a, self.regs.x, self.regs.y, self.regs.status, self.regs.sp,
            self.cycle_count
        );
    }

    pub(crate) fn read8(&mut self, bus: &mut Bus, addr: u16) -> u8 {
        bus.set(Some(addr), None, Some(true));
        bus.data
    }

    pub(crate) fn read16(&mut self, bus: &mut Bus, addr: u16) -> u16 {
        let lo = self.read8(bus, addr) as u16;
        let hi = self.read8(bus, addr.wrapping_add(1)) as u16;
        hi << 8 | lo
    }

    /// 下位バイトが $xxFF にある16ビットポインタを読むとき、上位バイトは
    /// $(xx+1)00 ではなく $xx00 から取られる（6502のページ内ラップ）
    pub(crate) fn read16_nowrap(&mut self, bus: &mut Bus, addr: u16) -> u16 {
        if addr & 0xFF != 0xFF {
            return self.read16(bus, addr);
        }
        let lo = self.read8(bus, addr) as u16;
        let hi = self.read8(bus, addr & 0xFF00) as u16;
        hi << 8 | lo
    }

    pub(crate) fn write8(&mut self, bus: &mut Bus, addr: u16, data: u8) {
        bus.set(Some(addr), Some(data), Some(false));
    }

    pub(crate) fn push8(&mut self, bus: &mut Bus, value: u8) {
        let addr = 0x0100 | self.regs.sp as u16;
        self.write8(bus, addr, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    pub(crate) fn pull8(&mut self, bus: &mut Bus) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let addr = 0x0100 | self.regs.sp as u16;
        self.read8(bus, addr)
    }

    pub(crate) fn push16(&mut self, bus: &mut Bus, value: u16) {
        self.push8(bus, (value >> 8) as u8);
        self.push8(bus, (value & 0xFF) as u8);
    }

    pub(crate) fn pull16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pull8(bus) as u16;
        let hi = self.pull8(bus) as u16;
        hi << 8 | lo
    }

    /// 結果値に応じて N / Z フラグを更新
    pub(crate) fn update_flags(&mut self, value: u8) {
        if value & 0x80 != 0 {
            self.regs.status |= flags::NEGATIVE;
        } else {
            self.regs.status &= !flags::NEGATIVE;
        }
        if value == 0 {
            self.regs.status |= flags::ZERO;
        } else {
            self.regs.status &= !flags::ZERO;
        }
    }

    pub(crate) fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.regs.status |= flag;
        } else {
            self.regs.status &= !flag;
        }
    }

    pub(crate) fn get_flag(&self, flag: u8) -> bool {
        self.regs.status & flag != 0
    }

    /// 分岐成立時の追加サイクル。ページをまたぐとさらに+1
    pub(crate) fn branch_on(&mut self, condition: bool) {
        if !condition {
            return;
        }
        self.cycle_count += 1;
        if pages_differ(self.regs.pc, self.al) {
            self.cycle_count += 1;
        }
        self.regs.pc = self.al;
    }

    pub(crate) fn al(&self) -> u16 {
        self.al
    }
}
