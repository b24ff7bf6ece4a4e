//! qoi - Encode and decode QOI images
//!
//! A command-line tool for converting images to/from the QOI format.

use clap::{Parser, Subcommand, ValueEnum};
use icy_qoi::{qoi_decode_reader, Channels, ColorSpace, Encoder, QoiHeader, QoiImage};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qoi")]
#[command(author = "Mike Krüger <mkrueger@posteo.de>")]
#[command(version)]
#[command(about = "Encode and decode QOI images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an image to QOI format
    Encode {
        /// Input image file (PNG, JPEG, GIF, WebP)
        input: PathBuf,

        /// Output QOI file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Colorspace tag written to the header
        #[arg(short, long, value_enum, default_value = "srgb")]
        colorspace: ColorSpaceArg,

        /// Always store an alpha channel, even for opaque sources
        #[arg(long)]
        rgba: bool,
    },

    /// Decode a QOI file to PNG
    Decode {
        /// Input QOI file (use - for stdin)
        input: PathBuf,

        /// Output PNG file (default: input with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the header of a QOI file
    Info {
        /// Input QOI file (use - for stdin)
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorSpaceArg {
    /// sRGB with linear alpha
    Srgb,
    /// All channels linear
    Linear,
}

impl From<ColorSpaceArg> for ColorSpace {
    fn from(arg: ColorSpaceArg) -> Self {
        match arg {
            ColorSpaceArg::Srgb => ColorSpace::Srgb,
            ColorSpaceArg::Linear => ColorSpace::Linear,
        }
    }
}

fn open_input(input: &Path) -> Result<Box<dyn Read>, Box<dyn std::error::Error>> {
    if input.to_string_lossy() == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        let file = File::open(input)
            .map_err(|e| format!("Failed to read '{}': {}", input.display(), e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            input,
            output,
            colorspace,
            rgba,
        } => {
            let img = image::open(&input)
                .map_err(|e| format!("Failed to open '{}': {}", input.display(), e))?;
            let (pixels, channels, (width, height)) = if rgba || img.color().has_alpha() {
                let rgba_img = img.to_rgba8();
                let dimensions = rgba_img.dimensions();
                (rgba_img.into_raw(), Channels::Rgba, dimensions)
            } else {
                let rgb_img = img.to_rgb8();
                let dimensions = rgb_img.dimensions();
                (rgb_img.into_raw(), Channels::Rgb, dimensions)
            };

            info!(
                "Encoding '{}' ({}x{}, {} channels)",
                input.display(),
                width,
                height,
                channels.count()
            );

            let header = QoiHeader::new(width, height, channels as u8, colorspace.into())?;
            let mut encoder = Encoder::new(&pixels, header)?;

            match output {
                Some(path) => {
                    let file = File::create(&path)?;
                    let written = encoder.encode_to(BufWriter::new(file))?;
                    info!("Written {} bytes to '{}'", written, path.display());
                }
                None => {
                    encoder.encode_to(io::stdout().lock())?;
                }
            }
        }

        Commands::Decode { input, output } => {
            let image = qoi_decode_reader(open_input(&input)?)?;

            let output_path = output.unwrap_or_else(|| {
                let mut p = input.clone();
                p.set_extension("png");
                p
            });

            let QoiImage {
                pixels,
                width,
                height,
                channels,
                ..
            } = image;
            match channels {
                Channels::Rgb => image::RgbImage::from_raw(width, height, pixels)
                    .ok_or("Failed to create image from decoded data")?
                    .save(&output_path)?,
                Channels::Rgba => image::RgbaImage::from_raw(width, height, pixels)
                    .ok_or("Failed to create image from decoded data")?
                    .save(&output_path)?,
            }

            info!(
                "Decoded: {}x{} pixels -> '{}'",
                width,
                height,
                output_path.display()
            );
        }

        Commands::Info { input } => {
            let mut head = Vec::new();
            open_input(&input)?
                .take(icy_qoi::consts::QOI_HEADER_SIZE as u64)
                .read_to_end(&mut head)?;
            let header = QoiHeader::parse(&head)?;

            println!("width:      {}", header.width);
            println!("height:     {}", header.height);
            println!("channels:   {}", header.channels.count());
            println!(
                "colorspace: {}",
                match header.colorspace {
                    ColorSpace::Srgb => "sRGB with linear alpha",
                    ColorSpace::Linear => "linear",
                }
            );
        }
    }

    Ok(())
}
