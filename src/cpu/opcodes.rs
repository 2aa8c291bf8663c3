//! 6502 命令の実装
//!
//! アドレッシングモード解決後の実効アドレス（al）を使って各命令を実行する。
//! 未定義オペコードは何もしない（PCとサイクルはテーブルに従って進む）。

use super::{flags, Cpu, VEC_IRQ};
use crate::bus::Bus;

impl Cpu {
    /// オペコードをディスパッチ
    pub(super) fn execute(&mut self, bus: &mut Bus, opcode: u8) {
        match opcode {
            // ロード / ストア
            0xA1 | 0xA5 | 0xA9 | 0xAD | 0xB1 | 0xB5 | 0xB9 | 0xBD => self.lda(bus),
            0xA2 | 0xA6 | 0xAE | 0xB6 | 0xBE => self.ldx(bus),
            0xA0 | 0xA4 | 0xAC | 0xB4 | 0xBC => self.ldy(bus),
            0x81 | 0x85 | 0x8D | 0x91 | 0x95 | 0x99 | 0x9D => self.sta(bus),
            0x86 | 0x8E | 0x96 => self.stx(bus),
            0x84 | 0x8C | 0x94 => self.sty(bus),

            // 転送
            0xAA => self.tax(),
            0xA8 => self.tay(),
            0xBA => self.tsx(),
            0x8A => self.txa(),
            0x9A => self.txs(),
            0x98 => self.tya(),

            // スタック
            0x48 => self.pha(bus),
            0x68 => self.pla(bus),
            0x08 => self.php(bus),
            0x28 => self.plp(bus),

            // 算術
            0x61 | 0x65 | 0x69 | 0x6D | 0x71 | 0x75 | 0x79 | 0x7D => self.adc(bus),
            0xE1 | 0xE5 | 0xE9 | 0xED | 0xF1 | 0xF5 | 0xF9 | 0xFD => self.sbc(bus),

            // 比較
            0xC1 | 0xC5 | 0xC9 | 0xCD | 0xD1 | 0xD5 | 0xD9 | 0xDD => self.cmp(bus),
            0xE0 | 0xE4 | 0xEC => self.cpx(bus),
            0xC0 | 0xC4 | 0xCC => self.cpy(bus),

            // インクリメント / デクリメント
            0xC6 | 0xCE | 0xD6 | 0xDE => self.dec(bus),
            0xE6 | 0xEE | 0xF6 | 0xFE => self.inc(bus),
            0xCA => self.dex(),
            0x88 => self.dey(),
            0xE8 => self.inx(),
            0xC8 => self.iny(),

            // 論理演算
            0x21 | 0x25 | 0x29 | 0x2D | 0x31 | 0x35 | 0x39 | 0x3D => self.and(bus),
            0x01 | 0x05 | 0x09 | 0x0D | 0x11 | 0x15 | 0x19 | 0x1D => self.ora(bus),
            0x41 | 0x45 | 0x49 | 0x4D | 0x51 | 0x55 | 0x59 | 0x5D => self.eor(bus),
            0x24 | 0x2C => self.bit(bus),

            // シフト / ローテート
            0x0A => self.asl_a(),
            0x06 | 0x0E | 0x16 | 0x1E => self.asl(bus),
            0x4A => self.lsr_a(),
            0x46 | 0x4E | 0x56 | 0x5E => self.lsr(bus),
            0x2A => self.rol_a(),
            0x26 | 0x2E | 0x36 | 0x3E => self.rol(bus),
            0x6A => self.ror_a(),
            0x66 | 0x6E | 0x76 | 0x7E => self.ror(bus),

            // 分岐
            0x90 => self.bcc(),
            0xB0 => self.bcs(),
            0xF0 => self.beq(),
            0xD0 => self.bne(),
            0x30 => self.bmi(),
            0x10 => self.bpl(),
            0x50 => self.bvc(),
            0x70 => self.bvs(),

            // ジャンプ / サブルーチン
            0x4C | 0x6C => self.jmp(),
            0x20 => self.jsr(bus),
            0x60 => self.rts(bus),
            0x00 => self.brk(bus),
            0x40 => self.rti(bus),

            // フラグ操作
            0x18 => self.set_flag(flags::CARRY, false),
            0x38 => self.set_flag(flags::CARRY, true),
            0x58 => self.set_flag(flags::IRQ_DISABLE, false),
            0x78 => self.set_flag(flags::IRQ_DISABLE, true),
            0xB8 => self.set_flag(flags::OVERFLOW, false),
            0xD8 => self.set_flag(flags::DECIMAL, false),
            0xF8 => self.set_flag(flags::DECIMAL, true),

            0xEA => {} // NOP

            // 未定義オペコードはNOP扱い
            _ => {}
        }
    }

    // LDA - Load Accumulator
    fn lda(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.regs.a = self.read8(bus, al);
        self.update_flags(self.regs.a);
    }

    // LDX - Load X Register
    fn ldx(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.regs.x = self.read8(bus, al);
        self.update_flags(self.regs.x);
    }

    // LDY - Load Y Register
    fn ldy(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.regs.y = self.read8(bus, al);
        self.update_flags(self.regs.y);
    }

    // STA - Store Accumulator
    fn sta(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.write8(bus, al, self.regs.a);
    }

    // STX - Store X Register
    fn stx(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.write8(bus, al, self.regs.x);
    }

    // STY - Store Y Register
    fn sty(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.write8(bus, al, self.regs.y);
    }

    // ADC - Add with carry
    // 注意: Dフラグは無視される（二進加算のみ）
    fn adc(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al);
        let mut result = self.regs.a as u16 + m as u16;
        if self.get_flag(flags::CARRY) {
            result += 1;
        }
        self.set_flag(flags::CARRY, result > 0xFF);
        // 両オペランドの符号が一致し、結果と食い違ったらオーバーフロー
        let overflow = (self.regs.a ^ m) & 0x80 == 0 && (self.regs.a as u16 ^ result) & 0x80 != 0;
        self.set_flag(flags::OVERFLOW, overflow);
        self.regs.a = (result & 0xFF) as u8;
        self.update_flags(self.regs.a);
    }

    // SBC - Subtract with carry: A ← A - M - (1 - C)
    fn sbc(&mut self, bus: &mut Bus) {
        let al = self.al();
        let a = self.regs.a;
        let m = self.read8(bus, al);
        let borrow = if self.get_flag(flags::CARRY) { 0 } else { 1 };
        self.regs.a = a.wrapping_sub(m).wrapping_sub(borrow);
        self.update_flags(self.regs.a);
        self.set_flag(
            flags::CARRY,
            a as i32 - m as i32 - borrow as i32 >= 0,
        );
        let overflow = (a ^ m) & 0x80 != 0 && (a ^ self.regs.a) & 0x80 != 0;
        self.set_flag(flags::OVERFLOW, overflow);
    }

    // AND with accumulator
    fn and(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.regs.a &= self.read8(bus, al);
        self.update_flags(self.regs.a);
    }

    // ORA - OR with accumulator
    fn ora(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.regs.a |= self.read8(bus, al);
        self.update_flags(self.regs.a);
    }

    // EOR - Exclusive OR with accumulator
    fn eor(&mut self, bus: &mut Bus) {
        let al = self.al();
        self.regs.a ^= self.read8(bus, al);
        self.update_flags(self.regs.a);
    }

    // BIT - ビット7/6をN/Vへコピー、ZはA&Mで判定
    fn bit(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al);
        self.regs.status = (m & 0xC0) | (self.regs.status & 0x3F);
        self.set_flag(flags::ZERO, m & self.regs.a == 0);
    }

    // ASL - Shift left (Accumulator)
    fn asl_a(&mut self) {
        self.set_flag(flags::CARRY, self.regs.a & 0x80 != 0);
        self.regs.a <<= 1;
        self.update_flags(self.regs.a);
    }

    // ASL - Shift left
    fn asl(&mut self, bus: &mut Bus) {
        let al = self.al();
        let mut m = self.read8(bus, al);
        self.set_flag(flags::CARRY, m & 0x80 != 0);
        m <<= 1;
        self.write8(bus, al, m);
        self.update_flags(m);
    }

    // LSR - Shift right (Accumulator)
    fn lsr_a(&mut self) {
        self.set_flag(flags::CARRY, self.regs.a & 0x01 != 0);
        self.regs.a >>= 1;
        self.update_flags(self.regs.a);
    }

    // LSR - Shift right
    fn lsr(&mut self, bus: &mut Bus) {
        let al = self.al();
        let mut m = self.read8(bus, al);
        self.set_flag(flags::CARRY, m & 0x01 != 0);
        m >>= 1;
        self.write8(bus, al, m);
        self.update_flags(m);
    }

    // ROL - Rotate left (Accumulator)
    fn rol_a(&mut self) {
        let carry_out = self.regs.a & 0x80 != 0;
        self.regs.a <<= 1;
        if self.get_flag(flags::CARRY) {
            self.regs.a |= 0x01;
        }
        self.set_flag(flags::CARRY, carry_out);
        self.update_flags(self.regs.a);
    }

    // ROL - Rotate left
    fn rol(&mut self, bus: &mut Bus) {
        let al = self.al();
        let mut m = self.read8(bus, al);
        let carry_out = m & 0x80 != 0;
        m <<= 1;
        if self.get_flag(flags::CARRY) {
            m |= 0x01;
        }
        self.set_flag(flags::CARRY, carry_out);
        self.write8(bus, al, m);
        self.update_flags(m);
    }

    // ROR - Rotate right (Accumulator)
    fn ror_a(&mut self) {
        let carry_out = self.regs.a & 0x01 != 0;
        self.regs.a >>= 1;
        if self.get_flag(flags::CARRY) {
            self.regs.a |= 0x80;
        }
        self.set_flag(flags::CARRY, carry_out);
        self.update_flags(self.regs.a);
    }

    // ROR - Rotate right
    fn ror(&mut self, bus: &mut Bus) {
        let al = self.al();
        let mut m = self.read8(bus, al);
        let carry_out = m & 0x01 != 0;
        m >>= 1;
        if self.get_flag(flags::CARRY) {
            m |= 0x80;
        }
        self.set_flag(flags::CARRY, carry_out);
        self.write8(bus, al, m);
        self.update_flags(m);
    }

    // CMP - Compare with accumulator
    fn cmp(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al);
        self.update_flags(self.regs.a.wrapping_sub(m));
        self.set_flag(flags::CARRY, self.regs.a >= m);
    }

    // CPX - Compare with X register
    fn cpx(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al);
        self.update_flags(self.regs.x.wrapping_sub(m));
        self.set_flag(flags::CARRY, self.regs.x >= m);
    }

    // CPY - Compare with Y register
    fn cpy(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al);
        self.update_flags(self.regs.y.wrapping_sub(m));
        self.set_flag(flags::CARRY, self.regs.y >= m);
    }

    // DEC - Decrement memory
    fn dec(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al).wrapping_sub(1);
        self.write8(bus, al, m);
        self.update_flags(m);
    }

    // INC - Increment memory
    fn inc(&mut self, bus: &mut Bus) {
        let al = self.al();
        let m = self.read8(bus, al).wrapping_add(1);
        self.write8(bus, al, m);
        self.update_flags(m);
    }

    fn dex(&mut self) {
        self.regs.x = self.regs.x.wrapping_sub(1);
        self.update_flags(self.regs.x);
    }

    fn dey(&mut self) {
        self.regs.y = self.regs.y.wrapping_sub(1);
        self.update_flags(self.regs.y);
    }

    fn inx(&mut self) {
        self.regs.x = self.regs.x.wrapping_add(1);
        self.update_flags(self.regs.x);
    }

    fn iny(&mut self) {
        self.regs.y = self.regs.y.wrapping_add(1);
        self.update_flags(self.regs.y);
    }

    // 分岐命令（成立時+1サイクル、ページクロスでさらに+1）
    fn bcc(&mut self) {
        let c = !self.get_flag(flags::CARRY);
        self.branch_on(c);
    }

    fn bcs(&mut self) {
        let c = self.get_flag(flags::CARRY);
        self.branch_on(c);
    }

    fn beq(&mut self) {
        let c = self.get_flag(flags::ZERO);
        self.branch_on(c);
    }

    fn bne(&mut self) {
        let c = !self.get_flag(flags::ZERO);
        self.branch_on(c);
    }

    fn bmi(&mut self) {
        let c = self.get_flag(flags::NEGATIVE);
        self.branch_on(c);
    }

    fn bpl(&mut self) {
        let c = !self.get_flag(flags::NEGATIVE);
        self.branch_on(c);
    }

    fn bvc(&mut self) {
        let c = !self.get_flag(flags::OVERFLOW);
        self.branch_on(c);
    }

    fn bvs(&mut self) {
        let c = self.get_flag(flags::OVERFLOW);
        self.branch_on(c);
    }

    // JMP
    fn jmp(&mut self) {
        self.regs.pc = self.al();
    }

    // JSR - 自身の3バイト命令の最終バイトのアドレスを積む
    fn jsr(&mut self, bus: &mut Bus) {
        let ret = self.regs.pc.wrapping_sub(1);
        self.push16(bus, ret);
        self.regs.pc = self.al();
    }

    // RTS - 積まれたアドレス+1へ復帰
    fn rts(&mut self, bus: &mut Bus) {
        self.regs.pc = self.pull16(bus).wrapping_add(1);
    }

    // BRK - PC（シグネチャバイトの次）とP（Bセット）を積み、
    // Iを立ててIRQベクタへ
    fn brk(&mut self, bus: &mut Bus) {
        let pc = self.regs.pc;
        self.push16(bus, pc);
        let p = self.regs.status | flags::BREAK;
        self.push8(bus, p);
        self.regs.status |= flags::IRQ_DISABLE;
        self.regs.pc = self.read16(bus, VEC_IRQ);
    }

    // RTI - Pを戻してからPCを戻す（+1しない）
    fn rti(&mut self, bus: &mut Bus) {
        self.regs.status = self.pull8(bus);
        self.regs.pc = self.pull16(bus);
        self.regs.status &= !flags::BREAK;
    }

    // PHA / PLA
    fn pha(&mut self, bus: &mut Bus) {
        self.push8(bus, self.regs.a);
    }

    fn pla(&mut self, bus: &mut Bus) {
        self.regs.a = self.pull8(bus);
        self.update_flags(self.regs.a);
    }

    // PHP - Bをセットして積み、レジスタ側のBはクリア
    fn php(&mut self, bus: &mut Bus) {
        let p = self.regs.status | flags::BREAK;
        self.push8(bus, p);
        self.regs.status &= !flags::BREAK;
    }

    // PLP - Bをマスクし、Unusedを強制セットして戻す
    fn plp(&mut self, bus: &mut Bus) {
        self.regs.status = self.pull8(bus);
        self.regs.status &= !flags::BREAK;
        self.regs.status |= flags::UNUSED;
    }

    // 転送命令
    fn tax(&mut self) {
        self.regs.x = self.regs.a;
        self.update_flags(self.regs.x);
    }

    fn tay(&mut self) {
        self.regs.y = self.regs.a;
        self.update_flags(self.regs.y);
    }

    fn tsx(&mut self) {
        self.regs.x = self.regs.sp;
        self.update_flags(self.regs.x);
    }

    fn txa(&mut self) {
        self.regs.a = self.regs.x;
        self.update_flags(self.regs.a);
    }

    fn tya(&mut self) {
        self.regs.a = self.regs.y;
        self.update_flags(self.regs.a);
    }

    // TXS - フラグは変化しない
    fn txs(&mut self) {
        self.regs.sp = self.regs.x;
    }
}
