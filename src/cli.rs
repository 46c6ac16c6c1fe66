use crate::comment_resolver::{CommentResolver, SidecarCommentResolver};
use crate::config::GeneratorConfig;
use crate::constraint::{ConstraintResolver, ValidatorConstraintReader};
use crate::doclet::{write_sidecars, Doclet};
use crate::field_descriptor::{assert_documented, FieldTable};
use crate::field_generator::FieldDocumentationGenerator;
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::shape::SourceShapeResolver;
use crate::snippet::SnippetAssembler;
use crate::translation::TranslationResolver;
use crate::type_ref::TypeRef;
use crate::type_resolver::TypeResolver;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// REST Docs from Source - Document API request and response fields from Rust sources
#[derive(Parser, Debug)]
#[command(name = "restdocs-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write one doc sidecar JSON file per documented item
    Extract {
        /// Path to the Rust project directory
        #[arg(value_name = "PROJECT_PATH")]
        project_path: PathBuf,

        /// Directory receiving the sidecar files
        #[arg(short = 'o', long = "output", value_name = "DIR")]
        output_dir: PathBuf,
    },
    /// Document the fields of a type
    Fields {
        #[command(flatten)]
        project: ProjectArgs,

        /// Type to document, e.g. `Item` or `Page<models::Item>`
        #[arg(value_name = "TYPE")]
        type_name: String,
    },
    /// Document the parameters, request and response fields of a handler function
    Endpoint {
        #[command(flatten)]
        project: ProjectArgs,

        /// Handler function, e.g. `get_item` or `handlers::get_item`
        #[arg(value_name = "HANDLER")]
        handler: String,
    },
}

/// Options shared by the documenting subcommands
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Configuration file (defaults to restdocs.yaml in the project directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read comments from doc sidecars in this directory instead of the sources
    #[arg(long = "sidecars", value_name = "DIR")]
    pub sidecar_dir: Option<PathBuf>,

    /// YAML or JSON file overriding message templates
    #[arg(long = "translations", value_name = "FILE")]
    pub translations: Option<PathBuf>,

    /// Fail when a field has no description
    #[arg(long = "strict")]
    pub strict: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
    /// One line per field
    Text,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    let project_path = match &args.command {
        Command::Extract { project_path, .. } => project_path,
        Command::Fields { project, .. } | Command::Endpoint { project, .. } => {
            &project.project_path
        }
    };

    if !project_path.exists() {
        anyhow::bail!("Project path does not exist: {}", project_path.display());
    }
    if !project_path.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", project_path.display());
    }

    info!("Project path: {}", project_path.display());
    Ok(args)
}

/// Run the selected subcommand
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Extract {
            project_path,
            output_dir,
        } => {
            let types = load_project(&project_path)?;
            let index = Doclet::new(&types).extract();
            let written = write_sidecars(&index, &output_dir)?;
            info!("Extracted {} doc sidecars", written);
            Ok(())
        }
        Command::Fields { project, type_name } => {
            let workspace = Workspace::load(&project)?;
            let root = TypeRef::parse(&type_name)?;
            let shapes = SourceShapeResolver::new(&workspace.types)
                .with_custom_serializers(&workspace.config.custom_serializers);
            let reader = ValidatorConstraintReader::new(&workspace.types);
            let generator = FieldDocumentationGenerator::new(
                &shapes,
                workspace.comments.as_ref(),
                ConstraintResolver::new(&reader, &workspace.translations),
            );

            let records = generator
                .generate_documentation(&root)
                .with_context(|| format!("Failed to document {}", type_name))?;
            info!("Documented {} fields of {}", records.len(), type_name);
            if workspace.config.strict {
                assert_documented(&records)?;
            }

            let table = FieldTable::from_records(&records, &workspace.translations);
            let text = table.to_text();
            emit(&project, &table, text)
        }
        Command::Endpoint { project, handler } => {
            let workspace = Workspace::load(&project)?;
            let shapes = SourceShapeResolver::new(&workspace.types)
                .with_custom_serializers(&workspace.config.custom_serializers);
            let reader = ValidatorConstraintReader::new(&workspace.types);
            let generator = FieldDocumentationGenerator::new(
                &shapes,
                workspace.comments.as_ref(),
                ConstraintResolver::new(&reader, &workspace.translations),
            );

            let documentation = SnippetAssembler::new(&workspace.types, generator)
                .strict(workspace.config.strict)
                .document_handler(&handler)
                .with_context(|| format!("Failed to document handler {}", handler))?;

            let text = documentation.to_text();
            emit(&project, &documentation, text)
        }
    }
}

/// Everything the documenting subcommands need, loaded once
struct Workspace {
    types: TypeResolver,
    comments: Box<dyn CommentResolver>,
    translations: TranslationResolver,
    config: GeneratorConfig,
}

impl Workspace {
    fn load(project: &ProjectArgs) -> Result<Self> {
        let mut config = GeneratorConfig::load(project.config.as_deref(), &project.project_path)
            .context("Failed to load configuration")?;
        if project.sidecar_dir.is_some() {
            config.sidecar_dir = project.sidecar_dir.clone();
        }
        if project.translations.is_some() {
            config.translations = project.translations.clone();
        }
        config.strict |= project.strict;

        let translations = config
            .translation_resolver()
            .context("Failed to load translations")?;
        let types = load_project(&project.project_path)?;

        let comments: Box<dyn CommentResolver> = match &config.sidecar_dir {
            Some(dir) => {
                let sidecars = FileScanner::new(dir.clone()).with_extension("json").scan()?;
                info!(
                    "Reading comments from {} doc sidecars in {}",
                    sidecars.files.len(),
                    dir.display()
                );
                Box::new(SidecarCommentResolver::new(dir.clone()))
            }
            None => {
                info!("Reading comments from the sources");
                Box::new(Doclet::new(&types).extract())
            }
        };

        Ok(Self {
            types,
            comments,
            translations,
            config,
        })
    }
}

/// Scan and parse every Rust file of a project
fn load_project(project_path: &Path) -> Result<TypeResolver> {
    info!("Scanning project directory...");
    let scan_result = FileScanner::new(project_path.to_path_buf()).scan()?;

    info!("Found {} Rust files", scan_result.files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.files.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    info!("Parsing Rust files...");
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.files)
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping file due to parse error: {}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} files", parsed_files.len());
    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    Ok(TypeResolver::new(parsed_files))
}

/// Serialize to the requested format and write to the output file or stdout
fn emit<T: Serialize>(project: &ProjectArgs, value: &T, text: String) -> Result<()> {
    let content = match project.output_format {
        OutputFormat::Yaml => serialize_yaml(value)?,
        OutputFormat::Json => serialize_json(value)?,
        OutputFormat::Text => text,
    };

    if let Some(output_path) = &project.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }
    Ok(())
}
