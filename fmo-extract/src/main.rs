//! Extract fast-moving object bounds from raw video frames into an easy-to-read file.

use clap::*;
use fmo::prelude::v1::{Result, *};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

fn parse_format(s: &str) -> Result<Format> {
    match s {
        "gray" => Ok(Format::Gray),
        "bgr" => Ok(Format::Bgr),
        "yuv420sp" => Ok(Format::Yuv420Sp),
        _ => bail!("unknown format '{}' (available: gray, bgr, yuv420sp)", s),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("fmo-extract")
        .version(crate_version!())
        .arg(
            Arg::new("width")
                .long("width")
                .short('w')
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .short('h')
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .takes_value(true)
                .default_value("gray"),
        )
        .arg(
            Arg::new("algorithm")
                .long("algorithm")
                .short('a')
                .takes_value(true)
                .default_value("explorer-v1"),
        )
        .arg(Arg::new("input").takes_value(true).required(true))
        .arg(Arg::new("output").takes_value(true).required(true))
        .get_matches();

    let width: usize = matches.value_of("width").unwrap().parse()?;
    let height: usize = matches.value_of("height").unwrap().parse()?;
    let format = parse_format(matches.value_of("format").unwrap())?;
    let algorithm = matches.value_of("algorithm").unwrap();
    let input = matches.value_of("input").unwrap();
    let output = matches.value_of("output").unwrap();

    let dims = Dims::new(width, height);
    let frame_bytes = num_bytes(format, dims)?;

    let mut detector =
        detector_loader::create_algorithm(algorithm, Config::default(), format, dims)?;

    let mut reader = BufReader::new(File::open(input)?);
    let mut out = BufWriter::new(File::create(output)?);

    let mut buf = vec![0u8; frame_bytes];
    let mut frame = Image::default();
    let mut frame_num = 0usize;

    // One raw frame per iteration; a clean EOF at a frame boundary ends the stream.
    loop {
        match reader.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        frame_num += 1;
        frame.assign(format, dims, &buf)?;
        detector.set_input_swap(&mut frame)?;

        if let Some(bounds) = detector.object_bounds() {
            log::info!(
                "frame {}: object at ({}, {})-({}, {})",
                frame_num,
                bounds.min.x,
                bounds.min.y,
                bounds.max.x,
                bounds.max.y
            );
            writeln!(
                out,
                "{} {} {} {} {}",
                frame_num, bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y
            )?;
        }
    }

    log::info!("processed {} frames", frame_num);

    Ok(())
}
