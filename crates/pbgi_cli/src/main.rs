mod obj;
mod scenes;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pbgi_core::{Color, Material, Scene};
use pbgi_renderer::{
    ImageBuffer, PointBasedRenderer, PointCloud, RayTracer, RenderConfig, SurfelHierarchy,
    TraceMode,
};

/// What to render.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Direct lighting only
    Raytrace,
    /// Path tracing with `--bounces` indirect bounces
    Path,
    /// Point-based global illumination
    Pbgi,
    /// Splat the surfel cloud directly
    Surfels,
}

/// Offline renderer with point-based global illumination.
#[derive(Parser, Debug)]
#[command(name = "pbgi", version, about)]
struct Args {
    /// Output image path (format from the extension)
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Mode::Pbgi)]
    mode: Mode,

    /// JSON render configuration; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ model placed inside the Cornell box
    #[arg(long)]
    obj: Option<PathBuf>,

    /// Write the surfel discs as an OBJ file
    #[arg(long)]
    dump_surfels: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Micro-buffer cells per side
    #[arg(long)]
    microbuffer: Option<usize>,

    /// Camera rays per pixel
    #[arg(long)]
    rayperpixel: Option<u32>,

    #[arg(long)]
    bounces: Option<u32>,

    /// Surfels per unit area
    #[arg(long)]
    sampling_rate: Option<f32>,

    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    /// Load the configuration file (or defaults) and apply flag overrides.
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => RenderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(size) = self.microbuffer {
            config.micro_buffer_size = size;
        }
        if let Some(spp) = self.rayperpixel {
            config.samples_per_pixel = spp;
        }
        if let Some(bounces) = self.bounces {
            config.max_bounces = bounces;
        }
        if let Some(rate) = self.sampling_rate {
            config.sampling_rate = rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn build_scene(args: &Args, config: &RenderConfig) -> Result<Scene> {
    let mut scene = scenes::cornell_box(config.aspect())?;

    if let Some(path) = &args.obj {
        let purple = Material::diffuse(Color::new(1.0, 0.5, 1.0));
        let model = obj::load_obj(path, purple)?;
        scene.add_mesh(model)?;
    }

    scene.build_bvh();
    log::info!(
        "Scene: {} meshes, {} triangles, {} lights",
        scene.meshes().len(),
        scene.triangle_count(),
        scene.lights().len()
    );
    Ok(scene)
}

/// Write the surfel discs as OBJ triangles.
fn write_surfel_obj(cloud: &PointCloud, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let triangles = cloud.disc_triangles();
    for triangle in &triangles {
        for v in triangle {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
    }
    for i in 0..triangles.len() {
        let base = 3 * i + 1;
        writeln!(out, "f {} {} {}", base, base + 1, base + 2)?;
    }
    out.flush()?;

    log::info!("Wrote {} surfel triangles to {}", triangles.len(), path.display());
    Ok(())
}

fn surfel_hierarchy(args: &Args, scene: &Scene, config: &RenderConfig) -> Result<SurfelHierarchy> {
    let start = Instant::now();
    let cloud = PointCloud::generate(scene, config.sampling_rate, config.seed)?;
    log::info!(
        "Point cloud: {} surfels in {:.2}s",
        cloud.len(),
        start.elapsed().as_secs_f32()
    );

    if let Some(path) = &args.dump_surfels {
        write_surfel_obj(&cloud, path)?;
    }

    let start = Instant::now();
    let hierarchy = SurfelHierarchy::build(&cloud);
    log::info!(
        "BSH: {} nodes in {:.2}s",
        hierarchy.node_count(),
        start.elapsed().as_secs_f32()
    );
    Ok(hierarchy)
}

fn render(args: &Args, scene: &Scene, config: RenderConfig) -> Result<ImageBuffer> {
    let image = match args.mode {
        Mode::Raytrace => RayTracer::new(config).render(scene)?,
        Mode::Path => RayTracer::new(config)
            .with_mode(TraceMode::Path)
            .render(scene)?,
        Mode::Pbgi => {
            let hierarchy = surfel_hierarchy(args, scene, &config)?;
            PointBasedRenderer::new(config).render(scene, &hierarchy)?
        }
        Mode::Surfels => {
            let hierarchy = surfel_hierarchy(args, scene, &config)?;
            PointBasedRenderer::new(config).render_surfels(scene, &hierarchy)?
        }
    };
    Ok(image)
}

fn save_image(image: &ImageBuffer, path: &Path) -> Result<()> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba())
        .context("Image buffer size does not match its dimensions")?;
    rgba.save(path)
        .with_context(|| format!("Failed to save image to {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = args.render_config()?;
    log::info!(
        "Rendering {:?} at {}x{} ({} spp, micro-buffer {}, {} surfels/unit area)",
        args.mode,
        config.width,
        config.height,
        config.samples_per_pixel,
        config.micro_buffer_size,
        config.sampling_rate
    );

    let scene = build_scene(&args, &config)?;

    let start = Instant::now();
    let image = render(&args, &scene, config)?;
    log::info!("Rendering: {:.2}s", start.elapsed().as_secs_f32());

    save_image(&image, &args.output)
}
