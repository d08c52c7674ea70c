use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use folio::plan_file::{self, PlanFile};
use folio::{CompositionPlan, DocumentCodec, LopdfCodec, PdfEditor, RenderOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// Edit, merge and preview PDF documents page by page.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults to $FOLIO_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Concatenate whole documents in the order given
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remove, reorder and splice pages of one document
    Edit {
        input: PathBuf,

        /// Pages to drop, e.g. "2,4,7-9"
        #[arg(long)]
        remove: Option<String>,

        /// Fragment to splice, "<anchor>[.<slot>]=<file>"; repeatable
        #[arg(long = "insert")]
        inserts: Vec<String>,

        /// Explicit output order, e.g. "1,3,i1.0,2"
        #[arg(long)]
        order: Option<String>,

        /// JSON plan file; replaces --remove, --insert and --order
        #[arg(long, conflicts_with_all = ["remove", "inserts", "order"])]
        plan: Option<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render a preview image of one page
    Preview {
        input: PathBuf,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long)]
        scale: Option<f32>,

        #[arg(long)]
        quality: Option<u8>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print page count and page sizes
    Info { input: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = folio::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Merge { inputs, output } => {
            let editor = folio::pdf_editor(config)?;
            let documents = inputs.iter().map(|path| read(path)).collect::<anyhow::Result<Vec<_>>>()?;
            let merged = editor.merge(&documents)?;
            if merged.page_count == 0 {
                bail!("The merged document has no pages; nothing written");
            }
            write(&output, &merged.bytes)?;
            println!("Merged {} pages into {}", merged.page_count, output.display());
        }
        Command::Edit { input, remove, inserts, order, plan, output } => {
            let plan = match plan {
                Some(path) => {
                    let base = path.parent().unwrap_or(Path::new(".")).to_path_buf();
                    PlanFile::load(&path)?.into_plan(&base)?
                }
                None => build_plan(remove.as_deref(), &inserts, order.as_deref())?,
            };

            let editor = folio::pdf_editor(config)?;
            let id = editor.create_session(&read(&input)?)?;
            let result = commit_and_take(&editor, id, plan);
            // Sessions never outlive a CLI run.
            editor.retire_session(id);
            let (page_count, bytes) = result?;

            write(&output, &bytes)?;
            println!("Wrote {} pages to {}", page_count, output.display());
        }
        Command::Preview { input, page, scale, quality, output } => {
            let defaults = config.preview.render_options();
            let options = RenderOptions {
                scale: scale.unwrap_or(defaults.scale),
                quality: quality.unwrap_or(defaults.quality),
            };
            let editor = folio::pdf_editor(config)?;
            let id = editor.create_session(&read(&input)?)?;
            let image = editor.preview_with(id, page, options);
            editor.retire_session(id);

            write(&output, &image?)?;
            println!("Rendered page {} of {} to {}", page, input.display(), output.display());
        }
        Command::Info { input } => {
            let codec = LopdfCodec::new();
            let document = codec.decode(&read(&input)?)?;
            println!("{}: PDF {}, {} pages", input.display(), document.inner().version, document.page_count());
            for index in 0..document.page_count() {
                if let Some(geometry) = document.geometry(index) {
                    let (width, height) = geometry.display_size();
                    println!(
                        "  page {:>4}: {:.0} x {:.0} pt, rotated {}",
                        index + 1,
                        width,
                        height,
                        geometry.rotation
                    );
                }
            }
        }
    }

    Ok(())
}

fn build_plan(
    remove: Option<&str>,
    inserts: &[String],
    order: Option<&str>,
) -> anyhow::Result<CompositionPlan> {
    let mut builder = CompositionPlan::builder();
    if let Some(pages) = remove {
        builder = builder.remove_all(plan_file::parse_pages(pages)?);
    }
    for insert in inserts {
        let (key, path) = plan_file::parse_insert(insert)?;
        builder = builder.insert_at(key, plan_file::read_fragment(&path)?);
    }
    if let Some(order) = order {
        builder = builder.order(plan_file::parse_order(order)?);
    }
    Ok(builder.build())
}

fn commit_and_take(
    editor: &PdfEditor,
    id: folio::SessionId,
    plan: CompositionPlan,
) -> anyhow::Result<(usize, Vec<u8>)> {
    let summary = editor.commit(id, plan)?;
    if summary.page_count == 0 {
        bail!("Every page was removed; nothing written");
    }
    let bytes = editor.take_output(id)?;
    Ok((summary.page_count, bytes.to_vec()))
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
