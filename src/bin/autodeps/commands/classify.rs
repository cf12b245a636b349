//! `autodeps classify` command

use anyhow::Result;
use serde::Serialize;

use crate::cli::{ClassifyArgs, OutputFormat};
use crate::GlobalOptions;
use autodeps::core::{BuildFile, HeaderIndex};
use autodeps::resolver::{Classification, Classifier};

#[derive(Serialize)]
struct ClassifiedHeader<'a> {
    header: &'a str,
    #[serde(flatten)]
    classification: Classification,
}

pub fn execute(args: ClassifyArgs, global_opts: &GlobalOptions) -> Result<()> {
    let ctx = &global_opts.ctx;

    let build_path = ctx.find_build_file()?;
    let build = BuildFile::load(&build_path)?;
    let tables = ctx.load_config(&build_path).mapping_tables();

    let index = HeaderIndex::build(build.targets());
    let classifier = Classifier::new(&index, &tables);
    tracing::debug!("{} headers indexed", index.len());

    let results: Vec<ClassifiedHeader<'_>> = args
        .headers
        .iter()
        .map(|header| ClassifiedHeader {
            header,
            classification: classifier.classify(header),
        })
        .collect();

    match args.format {
        OutputFormat::Json => global_opts.shell.print_json(&results)?,
        OutputFormat::Text => {
            for result in &results {
                println!("{}: {}", result.header, result.classification);
            }
        }
    }

    Ok(())
}
