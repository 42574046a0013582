use crate::tally::FluxResult;
use crate::Float;
use anyhow::{Context, Result};

/// Writes the cell centers, the normalized scalar flux and its standard
/// deviation as `.npy` arrays into `outdir`.
pub fn save_output(outdir: &str, centers: &[Float], flux: &FluxResult) -> Result<()> {
    std::fs::create_dir_all(outdir).context("Unable to create output directory")?;

    for (name, data) in &[
        ("x", centers),
        ("flux", &flux.scalar_flux[..]),
        ("std_dev", &flux.std_dev[..]),
    ] {
        let path = format!("{}/{}.npy", outdir, name);
        npy::to_file(&path, data.iter().cloned())
            .with_context(|| format!("Could not save {} data to file", name))?;
        log::info!("wrote {}", path);
    }

    Ok(())
}
