// main.rs      gifanim command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifanim::block::{Container, DisposalMethod, ImageBlock};
use gifanim::Decoder;
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    if let ("show", Some(matches)) = create_app().get_matches().subcommand() {
        show(&mut out, matches)?;
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifanim")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Animated GIF utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF frame table")
                .arg(
                    Arg::with_name("decode")
                        .short("d")
                        .long("decode")
                        .help("composite frames and report warnings"),
                )
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let decode = matches.is_present("decode");
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            show_file(out, path, decode)?;
        }
    }
    Ok(())
}

/// Text styles for output
struct Styles {
    dflt: ColorSpec,
    bold: ColorSpec,
    red: ColorSpec,
    yellow: ColorSpec,
    cyan: ColorSpec,
    magenta: ColorSpec,
}

impl Styles {
    fn new() -> Self {
        let mut dflt = ColorSpec::new();
        dflt.set_fg(Some(Color::White));
        let mut bold = ColorSpec::new();
        bold.set_fg(Some(Color::White))
            .set_intense(true)
            .set_bold(true);
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        let mut yellow = ColorSpec::new();
        yellow.set_fg(Some(Color::Yellow)).set_intense(true);
        let mut cyan = ColorSpec::new();
        cyan.set_fg(Some(Color::Cyan)).set_intense(true);
        let mut magenta = ColorSpec::new();
        magenta.set_fg(Some(Color::Magenta));
        Styles {
            dflt,
            bold,
            red,
            yellow,
            cyan,
            magenta,
        }
    }
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
    decode: bool,
) -> Result<(), Box<dyn Error>> {
    let styles = Styles::new();
    let container = Decoder::new(File::open(path)?).into_container()?;
    let blocks = container.image_blocks();
    let frame_digits = digits(blocks.len()).max(3);
    let width = container.screen_width();
    let height = container.screen_height();
    let size_digits = 4.max(1 + digits(width) + digits(height));
    let gif = String::from_utf8_lossy(&container.version()).to_string();
    let mut comments = vec![];
    for cmt in container.comments() {
        for c in cmt.comments() {
            for l in String::from_utf8_lossy(c).split('\n') {
                let l = l.trim();
                if !l.is_empty() {
                    comments.push(l.to_string());
                }
            }
        }
    }
    out.set_color(&styles.magenta)?;
    writeln!(out, "{:?}", path)?;
    out.set_color(&styles.bold)?;
    write!(out, "GIF{} {}x{}, frames: {}", gif, width, height, blocks.len())?;
    if container.applications().iter().any(|a| a.loop_count().is_some()) {
        write!(out, ", repeat: ")?;
        match container.loop_count() {
            0 => write!(out, "∞")?,
            c => write!(out, "{}", c)?,
        }
    }
    writeln!(out)?;
    out.set_color(&styles.cyan)?;
    for c in comments {
        writeln!(out, "  # {}", c)?;
    }
    out.set_color(&styles.yellow)?;
    write!(out, " {:>w$}", "Fr#", w = frame_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = size_digits)?;
    writeln!(out, " Clrs Trn")?;
    let global_clr = container.logical_screen_desc.color_table_config().len();
    let widths = (frame_digits, size_digits);
    for (n, block) in blocks.iter().enumerate() {
        show_frame(out, &styles, &container, block, n, global_clr, widths)?;
    }
    if decode {
        show_warnings(out, &styles, container)?;
    }
    Ok(())
}

/// Show one frame of a GIF file
fn show_frame(
    out: &mut StandardStream,
    styles: &Styles,
    container: &Container,
    block: &ImageBlock,
    number: usize,
    global_clr: usize,
    (frame_digits, size_digits): (usize, usize),
) -> Result<(), Box<dyn Error>> {
    let desc = &block.image_desc;
    let interlaced = if desc.interlaced() { 'i' } else { ' ' };
    out.set_color(&styles.dflt)?;
    write!(out, "{}", interlaced)?;
    out.set_color(&styles.bold)?;
    write!(out, "{:>w$}", number, w = frame_digits)?;
    if block.graphic_control_ext.is_none() {
        out.set_color(&styles.dflt)?;
    }
    write!(out, " {:6.2}", block.delay_secs())?;
    let d = if block.graphic_control_ext.is_some() {
        match block.disposal_method() {
            DisposalMethod::NoAction => "none",
            DisposalMethod::Keep => "keep",
            DisposalMethod::Background => "bg",
            DisposalMethod::Previous => "prev",
            DisposalMethod::Reserved(_) => "res",
        }
    } else {
        "-"
    };
    out.set_color(match d {
        "none" | "-" => &styles.dflt,
        "res" => &styles.red,
        _ => &styles.bold,
    })?;
    write!(out, " {:>4}", d)?;
    let full = container.screen_width() == desc.width()
        && container.screen_height() == desc.height();
    out.set_color(if full { &styles.dflt } else { &styles.bold })?;
    write!(
        out,
        " {:>w$}",
        &format!("{}x{}", desc.width(), desc.height()),
        w = size_digits
    )?;
    let origin = desc.left() == 0 && desc.top() == 0;
    out.set_color(if origin { &styles.dflt } else { &styles.bold })?;
    write!(
        out,
        " {:>w$}",
        &format!("{},{}", desc.left(), desc.top()),
        w = size_digits
    )?;
    let c = desc.color_table_config().len();
    if c > 0 {
        out.set_color(&styles.bold)?;
        write!(out, "  {:3}", c)?;
    } else if container.color_table(block).is_some() {
        out.set_color(&styles.dflt)?;
        write!(out, " {:3}g", global_clr)?;
    } else {
        out.set_color(&styles.red)?;
        write!(out, "    -")?;
    }
    match block.transparent_color() {
        Some(tc) => {
            out.set_color(&styles.bold)?;
            writeln!(out, " {:>3}", tc)?;
        }
        None => {
            out.set_color(&styles.dflt)?;
            writeln!(out, " {:>3}", "-")?;
        }
    }
    Ok(())
}

/// Composite all frames, then show warnings
fn show_warnings(
    out: &mut StandardStream,
    styles: &Styles,
    container: Container,
) -> Result<(), Box<dyn Error>> {
    let animation = gifanim::compose(container)?;
    if animation.warnings.is_empty() {
        out.set_color(&styles.dflt)?;
        writeln!(out, "decoded {} frame(s)", animation.frames.len())?;
    } else {
        out.set_color(&styles.red)?;
        for warning in &animation.warnings {
            writeln!(out, "  ! {}", warning)?;
        }
    }
    Ok(())
}

/// Calculate digits in a number
fn digits<T: Into<usize>>(v: T) -> usize {
    let v = v.into();
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
