//! Run a recognition pipeline on a saved capture and print the result as JSON.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

const USAGE: &str = "usage: scan <reward|snapit> <image.png> <catalog.json> [config.json]";

fn main() -> Result<()> {
	// Use `RUST_LOG=debug` etc.
	env_logger::init();

	let args = std::env::args().skip(1).collect::<Vec<_>>();
	let [mode, image_path, catalog_path, rest @ ..] = args.as_slice() else {
		bail!(USAGE);
	};

	let config = match rest.first() {
		Some(path) => ie::Config::load_from(path)?,
		None => ie::Config::load_or_default(),
	};
	let catalog = Arc::new(data::Catalog::load(catalog_path)?);
	let capture = image::open(image_path)
		.with_context(|| format!("open {image_path}"))?
		.to_rgb8();
	let capture = ie::OwnedImage::from_rgb_image(&capture);

	let engine = ie::Ie::try_new(config, catalog)?;
	let json = match mode.as_str() {
		"reward" => {
			let rewards = engine.relicreward_get_rewards(capture.as_image(), Default::default())?;
			serde_json::to_string_pretty(&rewards)?
		}
		"snapit" => {
			let items = engine.snapit_get_items(capture.as_image())?;
			serde_json::to_string_pretty(&items)?
		}
		other => bail!("unknown mode {other:?}\n{USAGE}"),
	};
	println!("{json}");
	Ok(())
}
