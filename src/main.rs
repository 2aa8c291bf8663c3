//! A2PIE - Apple IIe Emulator
//!
//! Version 0.1
//!
//! 小型シングルボードコンピュータ（とデスクトップ）向けの
//! Apple IIeエミュレータ。
//!
//! # 使用方法
//! ```
//! a2pie -1 dos33.dsk
//! ```

use a2pie::apple2::Apple2;
use a2pie::config::Config;
use a2pie::keyboard::SysKey;
use a2pie::video::{Video, SCREEN_HEIGHT, SCREEN_WIDTH};
use clap::Parser;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
use std::fs;
use std::time::{Duration, Instant};

/// A2PIE - Apple IIe Emulator
#[derive(Parser, Debug)]
#[command(name = "a2pie")]
#[command(author = "A2PIE Project")]
#[command(version = "0.1.0")]
#[command(about = "Apple IIe emulator for single-board computers", long_about = None)]
struct Args {
    /// ディスクイメージファイル（ドライブ1）
    #[arg(short = '1', long)]
    disk1: Option<String>,

    /// ディスクイメージファイル（ドライブ2）
    #[arg(short = '2', long)]
    disk2: Option<String>,

    /// システムROM（16KB、$C000-$FFFF）
    #[arg(long, default_value = "data/system.bin")]
    rom: String,

    /// Disk IIブートPROM（256バイト）
    #[arg(long, default_value = "data/boot.bin")]
    boot_rom: String,

    /// 文字ROM（4KB）
    #[arg(long, default_value = "data/video.bin")]
    char_rom: String,

    /// ウィンドウ拡大率（1/2/4、省略時は設定ファイル）
    #[arg(long)]
    scale: Option<usize>,

    /// モノクロ表示で起動
    #[arg(long)]
    mono: bool,

    /// ヘッドレスモード（ウィンドウなしで実行）
    #[arg(long)]
    headless: bool,

    /// 実行するサイクル数（ヘッドレスモード用）
    #[arg(long, default_value = "10000000")]
    cycles: u64,

    /// CPU命令トレースを出力
    #[arg(long)]
    trace: bool,
}

/// ROMファイルを読み込む。失敗したら終了
fn read_rom_file(path: &str, what: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to load {} {}: {}", what, path, e);
            std::process::exit(1);
        }
    }
}

/// RGBAフレームをPNGで保存
fn save_screenshot(filename: &str, frame: &[u8]) -> Result<(), String> {
    let file = fs::File::create(filename).map_err(|e| e.to_string())?;
    let writer = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(|e| e.to_string())?;

    let mut rgb = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT * 3);
    for px in frame.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    writer.write_image_data(&rgb).map_err(|e| e.to_string())?;
    Ok(())
}

/// ホストのキーをApple IIの文字コードに変換
fn key_to_ascii(key: Key, shift: bool, ctrl: bool) -> Option<u8> {
    // Ctrl+英字は制御文字
    if ctrl {
        let code = key as u8;
        if (Key::A as u8..=Key::Z as u8).contains(&code) {
            return Some(code - Key::A as u8 + 0x01);
        }
        return None;
    }

    let ch = match key {
        Key::A => b'A', Key::B => b'B', Key::C => b'C', Key::D => b'D',
        Key::E => b'E', Key::F => b'F', Key::G => b'G', Key::H => b'H',
        Key::I => b'I', Key::J => b'J', Key::K => b'K', Key::L => b'L',
        Key::M => b'M', Key::N => b'N', Key::O => b'O', Key::P => b'P',
        Key::Q => b'Q', Key::R => b'R', Key::S => b'S', Key::T => b'T',
        Key::U => b'U', Key::V => b'V', Key::W => b'W', Key::X => b'X',
        Key::Y => b'Y', Key::Z => b'Z',
        Key::Key0 => if shift { b')' } else { b'0' },
        Key::Key1 => if shift { b'!' } else { b'1' },
        Key::Key2 => if shift { b'@' } else { b'2' },
        Key::Key3 => if shift { b'#' } else { b'3' },
        Key::Key4 => if shift { b'$' } else { b'4' },
        Key::Key5 => if shift { b'%' } else { b'5' },
        Key::Key6 => if shift { b'^' } else { b'6' },
        Key::Key7 => if shift { b'&' } else { b'7' },
        Key::Key8 => if shift { b'*' } else { b'8' },
        Key::Key9 => if shift { b'(' } else { b'9' },
        Key::Space => b' ',
        Key::Tab => 0x09,
        Key::Comma => if shift { b'<' } else { b',' },
        Key::Period => if shift { b'>' } else { b'.' },
        Key::Slash => if shift { b'?' } else { b'/' },
        Key::Semicolon => if shift { b':' } else { b';' },
        Key::Apostrophe => if shift { b'"' } else { b'\'' },
        Key::LeftBracket => if shift { b'{' } else { b'[' },
        Key::RightBracket => if shift { b'}' } else { b']' },
        Key::Minus => if shift { b'_' } else { b'-' },
        Key::Equal => if shift { b'+' } else { b'=' },
        Key::Backslash => if shift { b'|' } else { b'\\' },
        Key::Backquote => if shift { b'~' } else { b'`' },
        _ => return None,
    };
    Some(ch)
}

/// ホストのキーをシステムキーに変換
fn key_to_syskey(key: Key) -> Option<SysKey> {
    match key {
        Key::Left | Key::Backspace => Some(SysKey::Left),
        Key::Right => Some(SysKey::Right),
        Key::Up => Some(SysKey::Up),
        Key::Down => Some(SysKey::Down),
        Key::Escape => Some(SysKey::Escape),
        Key::Enter => Some(SysKey::Return),
        Key::Delete => Some(SysKey::Delete),
        Key::F12 => Some(SysKey::Reset),
        _ => None,
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut config = Config::load();

    // ROMを読み込む（どれが欠けても致命的）
    let system_rom = read_rom_file(&args.rom, "system ROM");
    let boot_rom = read_rom_file(&args.boot_rom, "Disk II boot PROM");
    let char_rom = read_rom_file(&args.char_rom, "character ROM");

    let mut emu = match Apple2::new(&system_rom, &boot_rom) {
        Ok(emu) => emu,
        Err(e) => {
            eprintln!("Failed to build machine: {}", e);
            std::process::exit(1);
        }
    };
    emu.cpu.trace = args.trace;

    let mut video = match Video::new(&char_rom) {
        Ok(video) => video,
        Err(e) => {
            eprintln!("Failed to load character ROM: {}", e);
            std::process::exit(1);
        }
    };
    if args.mono || !config.color_display {
        if video.color_enabled() {
            video.toggle_color_mode();
        }
    }

    // ディスクを挿入（引数優先、なければ前回のパス）
    let disk1 = args.disk1.or(config.last_disk1.clone());
    let disk2 = args.disk2.or(config.last_disk2.clone());
    for (drive, path) in [(0, &disk1), (1, &disk2)] {
        if let Some(path) = path {
            match fs::read(path) {
                Ok(data) => match emu.insert_disk(drive, &data) {
                    Ok(()) => log::info!("Loaded disk {}: {}", drive + 1, path),
                    Err(e) => eprintln!("Failed to load disk {} {}: {}", drive + 1, path, e),
                },
                Err(e) => eprintln!("Failed to read disk {} {}: {}", drive + 1, path, e),
            }
        }
    }

    emu.reset();

    if args.headless {
        run_headless(&mut emu, args.cycles);
        return;
    }

    let scale = args.scale.unwrap_or(config.scale);
    run_with_window(&mut emu, &mut video, scale);

    // 終了時に設定を保存
    config.last_disk1 = disk1;
    config.last_disk2 = disk2;
    config.scale = scale;
    config.color_display = video.color_enabled();
    if let Err(e) = config.save() {
        log::warn!("{}", e);
    }
}

/// ウィンドウなしで指定サイクルを実行し、実効速度を表示する
fn run_headless(emu: &mut Apple2, cycles: u64) {
    let start = Instant::now();
    emu.run_cycles(cycles);
    let elapsed = start.elapsed();
    let mhz = (cycles as f64) / elapsed.as_secs_f64() / 1_000_000.0;
    println!(
        "Executed {} cycles in {:?} ({:.2} MHz effective)",
        cycles, elapsed, mhz
    );
    println!("Final PC: ${:04X}", emu.cpu.regs.pc);
}

fn run_with_window(emu: &mut Apple2, video: &mut Video, scale: usize) {
    let window_scale = match scale {
        2 => Scale::X2,
        4 => Scale::X4,
        1 => Scale::X1,
        other => {
            eprintln!("Unsupported scale {}, using 1", other);
            Scale::X1
        }
    };

    let mut window = match Window::new(
        "A2PIE - Apple IIe",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            scale: window_scale,
            ..WindowOptions::default()
        },
    ) {
        Ok(win) => win,
        Err(e) => {
            eprintln!("Failed to create window: {}", e);
            return;
        }
    };

    let frame_duration = Duration::from_millis(16);
    let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut shift_down = false;
    let mut ctrl_down = false;
    let mut open_apple_down = false;
    let mut filled_apple_down = false;
    let mut screenshot_count = 0u32;
    let mut frame_count = 0u64;

    while window.is_open() {
        let frame_start = Instant::now();

        // 修飾キーの遷移を機械へ伝える
        let shift = window.is_key_down(Key::LeftShift) || window.is_key_down(Key::RightShift);
        let ctrl = window.is_key_down(Key::LeftCtrl) || window.is_key_down(Key::RightCtrl);
        let open_apple = window.is_key_down(Key::LeftAlt);
        let filled_apple = window.is_key_down(Key::RightAlt);
        if shift != shift_down {
            shift_down = shift;
            if shift {
                emu.sys_key_down(SysKey::Shift);
            } else {
                emu.sys_key_up(SysKey::Shift);
            }
        }
        if ctrl != ctrl_down {
            ctrl_down = ctrl;
            if ctrl {
                emu.sys_key_down(SysKey::Control);
            } else {
                emu.sys_key_up(SysKey::Control);
            }
        }
        if open_apple != open_apple_down {
            open_apple_down = open_apple;
            if open_apple {
                emu.sys_key_down(SysKey::OpenApple);
            } else {
                emu.sys_key_up(SysKey::OpenApple);
            }
        }
        if filled_apple != filled_apple_down {
            filled_apple_down = filled_apple;
            if filled_apple {
                emu.sys_key_down(SysKey::FilledApple);
            } else {
                emu.sys_key_up(SysKey::FilledApple);
            }
        }

        for key in window.get_keys_pressed(KeyRepeat::Yes) {
            match key {
                Key::F9 => video.toggle_color_mode(),
                Key::F10 => {
                    if let Some(gpu) = emu.gpu_memory() {
                        let frame = video.render_frame(&gpu);
                        screenshot_count += 1;
                        let filename = format!("screenshot_{}.png", screenshot_count);
                        match save_screenshot(&filename, frame) {
                            Ok(()) => log::info!("Saved {}", filename),
                            Err(e) => log::warn!("Screenshot failed: {}", e),
                        }
                    }
                }
                _ => {
                    if let Some(sys) = key_to_syskey(key) {
                        emu.sys_key_down(sys);
                    } else if let Some(ch) = key_to_ascii(key, shift, ctrl) {
                        emu.key_type(ch);
                    }
                }
            }
        }

        emu.run_frame();

        // ディスクモーター回転中はフレーム描画もペーシングも省略して
        // 全速で回す
        if emu.fast_mode() {
            window.update();
            continue;
        }

        if let Some(gpu) = emu.gpu_memory() {
            let frame = video.render_frame(&gpu);
            for (dst, px) in buffer.iter_mut().zip(frame.chunks_exact(4)) {
                *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
            }
        }
        if let Err(e) = window.update_with_buffer(&buffer, SCREEN_WIDTH, SCREEN_HEIGHT) {
            log::warn!("Window update failed: {}", e);
        }

        frame_count += 1;
        if frame_count % 30 == 0 {
            let led = if emu.drive_led(false) || emu.drive_led(true) {
                " [DISK]"
            } else {
                ""
            };
            window.set_title(&format!("A2PIE - Apple IIe{}", led));
        }

        // 60Hzへのペーシング
        let elapsed = frame_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
