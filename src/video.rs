//! Apple IIe ビデオエミュレーション
//!
//! ソフトスイッチ状態と表示ページのスナップショットから560x384のRGBA
//! フレームを合成する純粋関数的なデコーダ。描画は2段構え:
//! まずパレットインデックスの中間スクリーンに各モードのセルを描き、
//! 最後にモードに応じた変換（Hi-Resのアーティファクト彩色、
//! Double Hi-ResのNTSC干渉テーブル、またはそのままのパレット引き）で
//! RGBAへ落とす。

use crate::memory::GpuMemory;

/// 画面サイズ
pub const SCREEN_WIDTH: usize = 560;
pub const SCREEN_HEIGHT: usize = 384;

/// 文字ROMのサイズ
pub const CHAR_ROM_SIZE: usize = 4096;

// パレットインデックス
const BLACK: u8 = 0;
const MAGENTA: u8 = 1;
const DARK_BLUE: u8 = 2;
const PURPLE: u8 = 3;
const DARK_GREEN: u8 = 4;
const GRAY: u8 = 5;
const MEDIUM_BLUE: u8 = 6;
const LIGHT_BLUE: u8 = 7;
const BROWN: u8 = 8;
const ORANGE: u8 = 9;
const GRAY2: u8 = 10;
const PINK: u8 = 11;
const LIGHT_GREEN: u8 = 12;
const YELLOW: u8 = 13;
const AQUAMARINE: u8 = 14;
const WHITE: u8 = 15;

/// Lo-Res 16色パレット（RGBA）
pub const LOW_RES_COLORS: [[u8; 4]; 16] = [
    [0, 0, 0, 255],
    [147, 11, 124, 255],
    [31, 53, 211, 255],
    [187, 54, 255, 255],
    [0, 118, 12, 255],
    [86, 86, 86, 255],
    [7, 168, 224, 255],
    [157, 172, 255, 255],
    [98, 76, 0, 255],
    [249, 86, 29, 255],
    [126, 126, 126, 255],
    [255, 129, 236, 255],
    [67, 200, 0, 255],
    [220, 205, 22, 255],
    [93, 247, 132, 255],
    [255, 255, 255, 0],
];

/// Double Hi-Resの4ビットカラー番号からパレットインデックスへの変換
const HI_RES_COLORS: [u8; 16] = [
    BLACK,
    MAGENTA,
    BROWN,
    ORANGE,
    DARK_GREEN,
    GRAY,
    LIGHT_GREEN,
    YELLOW,
    DARK_BLUE,
    PURPLE,
    GRAY2,
    PINK,
    MEDIUM_BLUE,
    LIGHT_BLUE,
    AQUAMARINE,
    WHITE,
];

/// テキスト/Lo-Res 24行の非線形な行先頭オフセット
pub const ROW_OFFSETS: [u16; 24] = [
    0x000, 0x080, 0x100, 0x180, 0x200, 0x280, 0x300, 0x380,
    0x028, 0x0A8, 0x128, 0x1A8, 0x228, 0x2A8, 0x328, 0x3A8,
    0x050, 0x0D0, 0x150, 0x1D0, 0x250, 0x2D0, 0x350, 0x3D0,
];

// Double Hi-Resのカラーブロック干渉テーブル。
// NTSCカラーバーストが左右の4ピクセルブロックと干渉した結果を引く。
//
// 参考資料:
// 1. http://www.appleoldies.ca/graphics/dhgr/dhgrtechnote.txt
// 2. http://lukazi.blogspot.com/2017/03/double-high-resolution-graphics-dhgr.html
const DOUBLE_HIRES_BLOCK_FROM: [[u16; 16]; 16] = [
    [0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000],
    [0x0000, 0x1110, 0x0000, 0x1110, 0x0000, 0x1110, 0x0000, 0x1110, 0x0000, 0x1110, 0x0000, 0x1110, 0x0000, 0x1110, 0x0000, 0x1110],
    [0x0000, 0x3300, 0x2200, 0x3300, 0x0000, 0x3300, 0x2200, 0x3300, 0x0000, 0x3300, 0x2200, 0x3300, 0x0000, 0x3300, 0x2200, 0x3300],
    [0x0000, 0x3300, 0x2200, 0x3300, 0x0000, 0x3300, 0x2200, 0x3300, 0x0000, 0x3300, 0x2200, 0x3300, 0x0000, 0x3300, 0x2200, 0x3300],
    [0x0400, 0x5500, 0x6400, 0x7500, 0x4400, 0x5500, 0x6400, 0x7500, 0x0400, 0x5500, 0x6400, 0x7500, 0x4400, 0x5500, 0x6400, 0x7500],
    [0x0500, 0x5500, 0x6500, 0x7500, 0x4500, 0x5500, 0x6500, 0x7500, 0x0500, 0x5500, 0x6500, 0x7500, 0x4500, 0x5500, 0x6500, 0x7500],
    [0x0600, 0x7700, 0x6600, 0x7700, 0x4600, 0x7700, 0x6600, 0x7700, 0x0600, 0x7700, 0x6600, 0x7700, 0x4600, 0x7700, 0x6600, 0x7700],
    [0x0700, 0x7700, 0x6700, 0x7700, 0x4700, 0x7700, 0x6700, 0x7700, 0x0700, 0x7700, 0x6700, 0x7700, 0x4700, 0x7700, 0x6700, 0x7700],
    [0x8000, 0x9000, 0xA000, 0xB000, 0x8000, 0x9000, 0xA000, 0xB000, 0x8000, 0x9000, 0xA000, 0xB000, 0x8000, 0x9000, 0xA000, 0xB000],
    [0x8990, 0x9990, 0xA990, 0xB990, 0x8990, 0x9990, 0xA990, 0xB990, 0x8990, 0x9990, 0xA990, 0xB990, 0x8990, 0x9990, 0xA990, 0xB990],
    [0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0, 0xAAA0, 0xBBA0],
    [0xABB0, 0xBBB0, 0xABB0, 0xBBB0, 0xABB0, 0xBBB0, 0xABB0, 0xBBB0, 0xABB0, 0xBBB0, 0xABB0, 0xBBB0, 0xABB0, 0xBBB0, 0xABB0, 0xBBB0],
    [0xCC00, 0xDD00, 0xEC00, 0xFD00, 0xCC00, 0xDD00, 0xEC00, 0xFD00, 0xCC00, 0xDD00, 0xEC00, 0xFD00, 0xCC00, 0xDD00, 0xEC00, 0xFD00],
    [0xCDD0, 0xDDD0, 0xEDD0, 0xFDD0, 0xCDD0, 0xDDD0, 0xEDD0, 0xFDD0, 0xCDD0, 0xDDD0, 0xEDD0, 0xFDD0, 0xCDD0, 0xDDD0, 0xEDD0, 0xFDD0],
    [0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0, 0xEEE0, 0xFFE0],
    [0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0, 0xEFF0, 0xFFF0],
];

const DOUBLE_HIRES_BLOCK_TO: [[u16; 16]; 16] = [
    [0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000],
    [0x0001, 0x0001, 0x0001, 0x0001, 0x0005, 0x0005, 0x0005, 0x0005, 0x0009, 0x0009, 0x0009, 0x0009, 0x000D, 0x000D, 0x000D, 0x000D],
    [0x0020, 0x0020, 0x0022, 0x0022, 0x0026, 0x0026, 0x0026, 0x0026, 0x00AA, 0x00AA, 0x00AA, 0x00AA, 0x00AE, 0x00AE, 0x00AE, 0x00AE],
    [0x0033, 0x0033, 0x0033, 0x0033, 0x0037, 0x0037, 0x0037, 0x0037, 0x00BB, 0x00BB, 0x00BB, 0x00BB, 0x00BF, 0x00BF, 0x00BF, 0x00BF],
    [0x0000, 0x0000, 0x0000, 0x0000, 0x0044, 0x0044, 0x0044, 0x0044, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC],
    [0x0055, 0x0055, 0x0055, 0x0055, 0x0055, 0x0055, 0x0055, 0x0055, 0x00DD, 0x00DD, 0x00DD, 0x00DD, 0x00DD, 0x00DD, 0x00DD, 0x00DD],
    [0x0060, 0x0060, 0x0062, 0x0062, 0x0066, 0x0066, 0x0066, 0x0066, 0x00EE, 0x00EE, 0x00EE, 0x00EE, 0x00EE, 0x00EE, 0x00EE, 0x00EE],
    [0x0077, 0x0077, 0x0077, 0x0077, 0x0077, 0x0077, 0x0077, 0x0077, 0x00FF, 0x00FF, 0x00FF, 0x00FF, 0x00FF, 0x00FF, 0x00FF, 0x00FF],
    [0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0888, 0x0888, 0x0888, 0x0888, 0x0888, 0x0888, 0x0888, 0x0888],
    [0x0001, 0x0001, 0x0001, 0x0001, 0x0005, 0x0005, 0x0005, 0x0005, 0x0009, 0x0009, 0x0009, 0x0009, 0x000D, 0x000D, 0x000D, 0x000D],
    [0x0000, 0x0000, 0x0002, 0x0002, 0x0006, 0x0006, 0x0006, 0x0006, 0x000A, 0x000A, 0x000A, 0x000A, 0x000E, 0x000E, 0x000E, 0x000E],
    [0x0003, 0x0003, 0x0003, 0x0003, 0x0007, 0x0007, 0x0007, 0x0007, 0x000B, 0x000B, 0x000B, 0x000B, 0x000F, 0x000F, 0x000F, 0x000F],
    [0x0000, 0x0000, 0x0000, 0x0000, 0x0044, 0x0044, 0x0044, 0x0044, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC, 0x00CC],
    [0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x000D, 0x000D, 0x000D, 0x000D, 0x000D, 0x000D, 0x000D, 0x000D],
    [0x0000, 0x0000, 0x0002, 0x0002, 0x0006, 0x0006, 0x0006, 0x0006, 0x000E, 0x000E, 0x000E, 0x000E, 0x000E, 0x000E, 0x000E, 0x000E],
    [0x0007, 0x0007, 0x0007, 0x0007, 0x0007, 0x0007, 0x0007, 0x0007, 0x000F, 0x000F, 0x000F, 0x000F, 0x000F, 0x000F, 0x000F, 0x000F],
];

/// ビデオデコーダ
pub struct Video {
    /// 文字ROM（4KB、1グリフ8バイト）
    char_rom: Vec<u8>,
    /// カラー表示かモノクロか
    render_color: bool,
    /// モノクロ時の表示色
    mono_color: [u8; 4],
    /// パレットインデックスの中間スクリーン
    screen: Vec<u8>,
    /// 出力RGBAフレーム
    frame: Vec<u8>,
}

impl Video {
    pub fn new(char_rom: &[u8]) -> Result<Self, String> {
        if char_rom.len() != CHAR_ROM_SIZE {
            return Err(format!(
                "character ROM must be {} bytes, got {}",
                CHAR_ROM_SIZE,
                char_rom.len()
            ));
        }
        Ok(Video {
            char_rom: char_rom.to_vec(),
            render_color: true,
            mono_color: LOW_RES_COLORS[LIGHT_GREEN as usize],
            screen: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frame: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT * 4],
        })
    }

    /// カラー/モノクロ表示を切り替え
    pub fn toggle_color_mode(&mut self) {
        self.render_color = !self.render_color;
    }

    pub fn color_enabled(&self) -> bool {
        self.render_color
    }

    /// モノクロ時の表示色を設定（デフォルトはライトグリーン）
    pub fn set_monochrome_color(&mut self, color: [u8; 4]) {
        self.mono_color = color;
    }

    #[inline]
    fn plot(&mut self, x: usize, y: usize, c: u8) {
        self.screen[y * SCREEN_WIDTH + x] = c;
    }

    #[inline]
    fn screen_at(&self, x: usize, y: usize) -> u8 {
        self.screen[y * SCREEN_WIDTH + x]
    }

    #[inline]
    fn put_frame(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = (y * SCREEN_WIDTH + x) * 4;
        self.frame[i..i + 4].copy_from_slice(&rgba);
    }

    /// 現在の表示ページからフレームを合成してRGBAバッファを返す
    pub fn render_frame(&mut self, gpu: &GpuMemory) -> &[u8] {
        self.screen.fill(BLACK);
        let mut start = gpu.start as usize;

        if !gpu.col_80 {
            for y in 0..24 {
                if gpu.mixed && gpu.hires && !gpu.text && y == 20 {
                    // MIXEDの下4行はテキストページに巻き戻す
                    start -= 0x1C00;
                }
                let graphics = !gpu.text && (!gpu.mixed || y <= 19);
                for x in 0..40 {
                    if gpu.hires && graphics {
                        let addr = start + x + ROW_OFFSETS[y] as usize;
                        self.draw_hires_cell(x * 14, y * 16, addr, gpu.main);
                    } else if !gpu.hires && graphics {
                        let addr = start + x + ROW_OFFSETS[y] as usize;
                        self.draw_lores_cell(x * 14, y * 16, addr, gpu.main, 14);
                    } else {
                        let glyph = gpu.main[start + x + ROW_OFFSETS[y] as usize];
                        self.draw_text_cell(x * 14, y * 16, glyph);
                    }
                }
            }
            if gpu.hires && !gpu.text {
                return self.colorize_hires();
            }
        } else {
            for y in 0..24 {
                if gpu.mixed && gpu.hires && !gpu.text && y == 20 {
                    start -= 0x1C00;
                }
                let graphics = !gpu.text && (!gpu.mixed || y <= 19);
                let mut x = 0;
                while x < 80 {
                    let addr = start + (x >> 1) + ROW_OFFSETS[y] as usize;
                    if gpu.hires && graphics {
                        if gpu.dhires {
                            // 1セルでaux/mainの2バイト組＝28ピクセルを消費する
                            self.draw_dhires_cell(x * 7, y * 16, addr, gpu.main, gpu.aux);
                            x += 2;
                        } else {
                            self.draw_hires_cell(x * 7, y * 16, addr, gpu.main);
                        }
                    } else if !gpu.hires && graphics {
                        self.draw_lores_cell(x * 7, y * 16, addr, gpu.main, 7);
                        self.draw_lores_cell((x + 1) * 7, y * 16, addr, gpu.aux, 7);
                    } else {
                        self.draw_text80_cell(x * 7, y * 16, gpu.main[addr]);
                        self.draw_text80_cell((x + 1) * 7, y * 16, gpu.aux[addr]);
                    }
                    x += 2;
                }
            }
            if gpu.hires && !gpu.text {
                if gpu.dhires {
                    return self.colorize_dhires();
                }
                return self.colorize_hires();
            }
        }

        self.render_display()
    }

    /// Hi-Resセル（7ピクセル×8ライン、2倍拡大で14x16）
    ///
    /// bit7はハーフピクセル遅延の選択。中間スクリーンでは遅延グループを
    /// LIGHT_BLUEで区別しておき、彩色段階で使う
    fn draw_hires_cell(&mut self, x0: usize, y0: usize, addr: usize, mem: &[u8]) {
        for y in (0..16).step_by(2) {
            let data = mem[addr + (y >> 1) * 0x400];
            let color = if data & 0x80 != 0 { LIGHT_BLUE } else { WHITE };
            for x in (0..14).step_by(2) {
                if data & (1 << (x >> 1)) != 0 {
                    self.plot(x0 + x, y0 + y, color);
                    self.plot(x0 + x + 1, y0 + y, color);
                    self.plot(x0 + x, y0 + y + 1, color);
                    self.plot(x0 + x + 1, y0 + y + 1, color);
                }
            }
        }
    }

    /// Double Hi-Resセル: aux偶数、main偶数、aux奇数、main奇数の
    /// 4バイトで28ピクセル。中間スクリーンには白だけを置く
    fn draw_dhires_cell(&mut self, x0: usize, y0: usize, addr: usize, mem: &[u8], aux: &[u8]) {
        for y in (0..16).step_by(2) {
            let row = addr + (y >> 1) * 0x400;
            let group = [aux[row], mem[row], aux[row + 1], mem[row + 1]];
            for (g, &data) in group.iter().enumerate() {
                for x in 0..7 {
                    if data & (1 << x) != 0 {
                        self.plot(x0 + g * 7 + x, y0 + y, WHITE);
                        self.plot(x0 + g * 7 + x, y0 + y + 1, WHITE);
                    }
                }
            }
        }
    }

    /// Lo-Resセル。下位ニブルが上半分、上位ニブルが下半分の色
    fn draw_lores_cell(&mut self, x0: usize, y0: usize, addr: usize, mem: &[u8], width: usize) {
        let top = mem[addr] & 0x0F;
        let bottom = mem[addr] >> 4;
        for y in 0..16 {
            let c = if y < 8 { top } else { bottom };
            for x in 0..width {
                self.plot(x0 + x, y0 + y, c);
            }
        }
    }

    /// テキストセル（40桁、14x16）。ROMのビットが0のところが点灯
    fn draw_text_cell(&mut self, x0: usize, y0: usize, glyph: u8) {
        let offset = glyph as usize * 8;
        for y in (0..16).step_by(2) {
            let data = self.char_rom[offset + (y >> 1)];
            for x in (0..14).step_by(2) {
                if data & (1 << (x >> 1)) == 0 {
                    self.plot(x0 + x, y0 + y, WHITE);
                    self.plot(x0 + x + 1, y0 + y, WHITE);
                    self.plot(x0 + x, y0 + y + 1, WHITE);
                    self.plot(x0 + x + 1, y0 + y + 1, WHITE);
                }
            }
        }
    }

    /// テキストセル（80桁、7x16）
    fn draw_text80_cell(&mut self, x0: usize, y0: usize, glyph: u8) {
        let offset = glyph as usize * 8;
        for y in (0..16).step_by(2) {
            let data = self.char_rom[offset + (y >> 1)];
            for x in 0..7 {
                if data & (1 << x) == 0 {
                    self.plot(x0 + x, y0 + y, WHITE);
                    self.plot(x0 + x, y0 + y + 1, WHITE);
                }
            }
        }
    }

    /// 中間スクリーンをそのままパレットで引いてRGBAにする
    fn render_display(&mut self) -> &[u8] {
        for i in 0..SCREEN_WIDTH * SCREEN_HEIGHT {
            let c = self.screen[i];
            let rgba = if !self.render_color && c != BLACK {
                self.mono_color
            } else {
                LOW_RES_COLORS[c as usize]
            };
            self.frame[i * 4..i * 4 + 4].copy_from_slice(&rgba);
        }
        &self.frame
    }

    /// Hi-Resのアーティファクト彩色
    ///
    /// 2ピクセルのセル単位に左右の点灯状態を見る。孤立した点灯セルは
    /// カラム偶奇と遅延ビットで紫/青または緑/橙、隣と連続していれば白
    fn colorize_hires(&mut self) -> &[u8] {
        if !self.render_color {
            return self.render_display();
        }
        for y in (0..SCREEN_HEIGHT).step_by(2) {
            for x in (0..SCREEN_WIDTH).step_by(2) {
                let c = self.screen_at(x, y);
                let lit = c != BLACK;
                let lit_before = x > 0 && self.screen_at(x - 1, y) != BLACK;
                let lit_after = x < 558 && self.screen_at(x + 2, y) != BLACK;

                let mut color = LOW_RES_COLORS[BLACK as usize];
                if lit && !lit_before && !lit_after {
                    let index = if (x >> 1) & 1 != 0 {
                        // 奇数カラムは緑または橙
                        if c != LIGHT_BLUE { LIGHT_GREEN } else { ORANGE }
                    } else {
                        // 偶数カラムは紫または青
                        if c != LIGHT_BLUE { PURPLE } else { MEDIUM_BLUE }
                    };
                    color = LOW_RES_COLORS[index as usize];
                } else if lit {
                    color = LOW_RES_COLORS[WHITE as usize];
                }

                self.put_frame(x, y, color);
                self.put_frame(x + 1, y, color);
                self.put_frame(x, y + 1, color);
                self.put_frame(x + 1, y + 1, color);
            }
        }
        &self.frame
    }

    /// Double Hi-Resの彩色。4ピクセル単位のブロックを左右の隣接
    /// ブロックとの干渉テーブルに通して4つのカラー番号を得る
    fn colorize_dhires(&mut self) -> &[u8] {
        if !self.render_color {
            return self.render_display();
        }
        for y in (0..SCREEN_HEIGHT).step_by(2) {
            for x in (0..SCREEN_WIDTH).step_by(4) {
                let block = |video: &Self, base: usize| -> usize {
                    let mut bits = 0;
                    for i in 0..4 {
                        if video.screen_at(base + i, y) != BLACK {
                            bits |= 8 >> i;
                        }
                    }
                    bits
                };
                let from = if x > 0 { block(self, x - 4) } else { 0 };
                let cur = block(self, x);
                let to = if x < 556 { block(self, x + 4) } else { 0 };

                let result =
                    DOUBLE_HIRES_BLOCK_FROM[cur][from] | DOUBLE_HIRES_BLOCK_TO[cur][to];

                for i in 0..4 {
                    let nibble = (result >> (12 - i * 4)) & 0x0F;
                    let color = LOW_RES_COLORS[HI_RES_COLORS[nibble as usize] as usize];
                    self.put_frame(x + i, y, color);
                    self.put_frame(x + i, y + 1, color);
                }
            }
        }
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn video_with_rom(rom: &[u8]) -> Video {
        Video::new(rom).unwrap()
    }

    fn blank_rom() -> Vec<u8> {
        // 全ビット1 → テキストは何も点灯しない
        vec![0xFF; CHAR_ROM_SIZE]
    }

    fn frame_px(frame: &[u8], x: usize, y: usize) -> [u8; 4] {
        let i = (y * SCREEN_WIDTH + x) * 4;
        [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
    }

    fn text_memory() -> Memory {
        let mut mem = Memory::new();
        mem.switches.text = true;
        // テキストページ1をスペース相当で埋める
        for addr in 0x400..0x800 {
            mem.main_ram[addr] = 0;
            mem.aux_ram[addr] = 0;
        }
        mem
    }

    #[test]
    fn test_char_rom_size_validation() {
        assert!(Video::new(&[0u8; 100]).is_err());
        assert!(Video::new(&blank_rom()).is_ok());
    }

    #[test]
    fn test_row_offsets_interleave() {
        // 行0-7、8-15、16-23が3つのグループに分かれる
        assert_eq!(ROW_OFFSETS[0], 0x000);
        assert_eq!(ROW_OFFSETS[8], 0x028);
        assert_eq!(ROW_OFFSETS[16], 0x050);
        assert_eq!(ROW_OFFSETS[22], 0x350);
        for row in 0..24 {
            let group = row / 8;
            let line = row % 8;
            assert_eq!(ROW_OFFSETS[row] as usize, group * 0x28 + line * 0x80);
        }
    }

    #[test]
    fn test_text_glyph_rendering() {
        let mut rom = blank_rom();
        // グリフ$C1の先頭ラインのbit0だけを点灯させる
        rom[0xC1 * 8] = 0xFE;
        let mut video = video_with_rom(&rom);
        let mut mem = text_memory();
        mem.main_ram[0x400] = 0xC1; // 行0列0
        let frame = video.render_frame(&mem.gpu_memory());
        // 点灯ピクセルは2x2に拡大された白
        assert_eq!(frame_px(frame, 0, 0), LOW_RES_COLORS[WHITE as usize]);
        assert_eq!(frame_px(frame, 1, 1), LOW_RES_COLORS[WHITE as usize]);
        // 同じラインの他のビットは消灯
        assert_eq!(frame_px(frame, 2, 0), LOW_RES_COLORS[BLACK as usize]);
    }

    #[test]
    fn test_text80_packs_main_then_aux() {
        let mut rom = blank_rom();
        rom[0x01 * 8] = 0xFE; // グリフ1: bit0点灯
        rom[0x02 * 8] = 0xFF; // グリフ2: 消灯
        let mut video = video_with_rom(&rom);
        let mut mem = text_memory();
        mem.switches.col_80 = true;
        mem.main_ram[0x400] = 0x01;
        mem.aux_ram[0x400] = 0x02;
        let frame = video.render_frame(&mem.gpu_memory());
        // メインバイトが左7ピクセル、補助バイトが右7ピクセル
        assert_eq!(frame_px(frame, 0, 0), LOW_RES_COLORS[WHITE as usize]);
        assert_eq!(frame_px(frame, 7, 0), LOW_RES_COLORS[BLACK as usize]);
    }

    #[test]
    fn test_lores_nibble_colors() {
        let mut video = video_with_rom(&blank_rom());
        let mut mem = Memory::new();
        mem.switches.text = false;
        mem.switches.hires = false;
        for addr in 0x400..0x800 {
            mem.main_ram[addr] = 0;
        }
        mem.main_ram[0x400] = 0x12; // 上半分=2、下半分=1
        let frame = video.render_frame(&mem.gpu_memory());
        assert_eq!(frame_px(frame, 0, 0), LOW_RES_COLORS[2]);
        assert_eq!(frame_px(frame, 0, 8), LOW_RES_COLORS[1]);
    }

    #[test]
    fn test_hires_isolated_pixel_artifact_colors() {
        let mut video = video_with_rom(&blank_rom());
        let mut mem = Memory::new();
        mem.switches.text = false;
        mem.switches.hires = true;
        for addr in 0x2000..0x4000 {
            mem.main_ram[addr] = 0;
        }
        // 孤立した偶数カラムのドット → 紫
        mem.main_ram[0x2000] = 0x01;
        // 遅延ビット付きの孤立ドット（次の行）→ 青
        mem.main_ram[0x2400] = 0x81;
        let frame = video.render_frame(&mem.gpu_memory());
        assert_eq!(frame_px(frame, 0, 0), LOW_RES_COLORS[PURPLE as usize]);
        assert_eq!(frame_px(frame, 0, 2), LOW_RES_COLORS[MEDIUM_BLUE as usize]);
    }

    #[test]
    fn test_hires_adjacent_pixels_render_white() {
        let mut video = video_with_rom(&blank_rom());
        let mut mem = Memory::new();
        mem.switches.text = false;
        mem.switches.hires = true;
        for addr in 0x2000..0x4000 {
            mem.main_ram[addr] = 0;
        }
        mem.main_ram[0x2000] = 0x03; // 隣接した2ドット
        let frame = video.render_frame(&mem.gpu_memory());
        assert_eq!(frame_px(frame, 0, 0), LOW_RES_COLORS[WHITE as usize]);
        assert_eq!(frame_px(frame, 2, 0), LOW_RES_COLORS[WHITE as usize]);
    }

    #[test]
    fn test_dhires_solid_pattern_is_white() {
        let mut video = video_with_rom(&blank_rom());
        let mut mem = Memory::new();
        mem.switches.text = false;
        mem.switches.hires = true;
        mem.switches.col_80 = true;
        mem.switches.dhires = true;
        for addr in 0x2000..0x4000 {
            mem.main_ram[addr] = 0x7F;
            mem.aux_ram[addr] = 0x7F;
        }
        let frame = video.render_frame(&mem.gpu_memory());
        assert_eq!(frame_px(frame, 100, 100), LOW_RES_COLORS[WHITE as usize]);
        assert_eq!(frame_px(frame, 280, 190), LOW_RES_COLORS[WHITE as usize]);
    }

    #[test]
    fn test_mixed_mode_bottom_rows_are_text() {
        let mut rom = blank_rom();
        rom[0xC1 * 8] = 0xFC; // bit0-1が点灯 → 連続4ピクセル
        let mut video = video_with_rom(&rom);
        let mut mem = Memory::new();
        mem.switches.text = false;
        mem.switches.hires = true;
        mem.switches.mixed = true;
        for addr in 0x2000..0x4000 {
            mem.main_ram[addr] = 0;
        }
        for addr in 0x400..0x800 {
            mem.main_ram[addr] = 0xFF; // グリフ$FF: 全ビット1 → 消灯
        }
        // 行20の先頭にグリフ$C1
        mem.main_ram[0x400 + ROW_OFFSETS[20] as usize] = 0xC1;
        let frame = video.render_frame(&mem.gpu_memory());
        // 行20はテキストとして描かれる。連続ピクセルは彩色段階で白になる。
        // グラフィックスとして解釈されていればビット6（x=24）も点灯するはず
        let y = 20 * 16;
        assert_eq!(frame_px(frame, 0, y), LOW_RES_COLORS[WHITE as usize]);
        assert_eq!(frame_px(frame, 2, y), LOW_RES_COLORS[WHITE as usize]);
        assert_eq!(frame_px(frame, 6, y), LOW_RES_COLORS[BLACK as usize]);
        assert_eq!(frame_px(frame, 24, y), LOW_RES_COLORS[BLACK as usize]);
    }

    #[test]
    fn test_monochrome_mode() {
        let mut video = video_with_rom(&blank_rom());
        video.toggle_color_mode(); // モノクロへ
        let mut mem = Memory::new();
        mem.switches.text = false;
        mem.switches.hires = true;
        for addr in 0x2000..0x4000 {
            mem.main_ram[addr] = 0;
        }
        mem.main_ram[0x2000] = 0x01;
        let frame = video.render_frame(&mem.gpu_memory());
        // アーティファクト彩色はスキップされ、点灯ピクセルはモノクロ色
        assert_eq!(frame_px(frame, 0, 0), LOW_RES_COLORS[LIGHT_GREEN as usize]);
        assert_eq!(frame_px(frame, 4, 0), LOW_RES_COLORS[BLACK as usize]);
    }
}
