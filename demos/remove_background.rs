//! Remove the background of a single image, printing progress.
//!
//! Usage:
//! ```sh
//! cargo run --example remove_background -- input.jpg output.png
//! ```

use std::env;
use std::process;

use classic_bg_removal::{opaque_ratio, save_image, BackgroundRemover};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output.png>", args[0]);
        process::exit(1);
    }

    let mut img = match image::open(&args[1]) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let remover = BackgroundRemover::default();
    let mut report = |percent: u8| println!("Processing: {percent}%");
    if let Err(e) = remover.remove(&mut img, &mut report) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    if let Err(e) = save_image(&img, args[2].as_ref()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    println!("Done: {:.0}% of pixels kept", opaque_ratio(&img) * 100.0);
}
