use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process::ExitCode,
};

use fileio::input::SourceFile;
use translator::Translator;

mod codegen;
mod common;
mod fileio;
mod parser;
mod translator;

fn main() -> ExitCode {
    let arguments: Vec<String> = std::env::args().skip(1).collect();

    let config = match Config::from_arguments(&arguments) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: jackc <input> [output] [--debug] [--no-bootstrap]");
            return ExitCode::FAILURE;
        }
    };

    let outcome = if fileio::input::collect_sources(&config.input, "jack").is_ok() {
        compile(&config)
    } else {
        translate(&config)
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

struct Config {
    input: PathBuf,
    output: Option<PathBuf>,
    debug: bool,
    bootstrap: bool,
}

impl Config {
    fn from_arguments(arguments: &[String]) -> Result<Self, String> {
        let mut paths = Vec::new();
        let mut debug = false;
        let mut bootstrap = true;

        for argument in arguments {
            match argument.as_str() {
                "--debug" => debug = true,
                "--no-bootstrap" => bootstrap = false,
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown option: {flag}"));
                }
                path => paths.push(PathBuf::from(path)),
            }
        }

        let mut paths = paths.into_iter();
        let input = paths.next().ok_or("missing input path")?;
        let output = paths.next();

        if paths.next().is_some() {
            return Err(String::from("too many arguments"));
        }

        Ok(Self {
            input,
            output,
            debug,
            bootstrap,
        })
    }

    /// Directory receiving `.vm` files in compile mode.
    fn out_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            if self.input.is_dir() {
                self.input.clone()
            } else {
                self.input.parent().unwrap_or(Path::new(".")).to_path_buf()
            }
        })
    }

    /// Path of the single `.asm` output in translate mode.
    fn asm_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("asm"))
    }
}

/// Compile every `.jack` source into a `.vm` file, then emit the
/// payloads of the OS classes the program referenced.
fn compile(config: &Config) -> Result<(), String> {
    let sources = fileio::input::collect_sources(&config.input, "jack")
        .map_err(|error| error.to_string())?;
    let out_dir = config.out_dir();

    let mut program_context = codegen::context::ProgramContext::new();

    for path in sources {
        let source_file = SourceFile::load(&path)
            .map_err(|error| format!("unable to load `{}`: {error}", path.display()))?;

        let class = match parser::parse_class(&source_file) {
            Ok(class) => class,
            Err(errors) => {
                error_report::display(
                    path.to_string_lossy().as_ref(),
                    source_file.content(),
                    errors,
                );
                return Err(format!("aborted: `{}` did not parse", path.display()));
            }
        };

        let content = codegen::construct_class(&class, &mut program_context)
            .map_err(|error| format!("error {}: {error}", path.display()))?;

        let output_file =
            fileio::output::OutputFile::new(source_file.short_name().to_string(), content);
        generate(&out_dir, &output_file)?;
    }

    for output_file in &program_context.os_library.collect() {
        generate(&out_dir, output_file)?;
    }

    Ok(())
}

fn generate(out_dir: &Path, output_file: &fileio::output::OutputFile) -> Result<(), String> {
    let path = fileio::output::generate(out_dir, output_file)
        .map_err(|error| format!("unable to write `{}`: {error}", output_file.name()))?;
    println!("out: {}", path.display());

    Ok(())
}

/// Translate every `.vm` source into one `.asm` output.
fn translate(config: &Config) -> Result<(), String> {
    let sources =
        fileio::input::collect_sources(&config.input, "vm").map_err(|error| error.to_string())?;
    let asm_path = config.asm_path();

    let out = File::create(&asm_path)
        .map_err(|error| format!("unable to create `{}`: {error}", asm_path.display()))?;

    let options = translator::Options {
        bootstrap: config.bootstrap,
        debug: config.debug,
    };
    let mut translator = Translator::new(out, options);

    for path in sources {
        if let Err(message) = translate_source(&path, &mut translator) {
            fileio::output::remove_partial(&asm_path);
            return Err(message);
        }
    }

    if let Err(error) = translator.finish() {
        fileio::output::remove_partial(&asm_path);
        return Err(format!(
            "unable to write `{}`: {error}",
            asm_path.display()
        ));
    }

    println!("out: {}", asm_path.display());
    Ok(())
}

fn translate_source(
    path: &Path,
    translator: &mut Translator<File>,
) -> Result<(), String> {
    let file = File::open(path)
        .map_err(|error| format!("unable to load `{}`: {error}", path.display()))?;

    let short_name = fileio::input::short_name(path);

    let mut view = translator.file(short_name);
    let commands = translator::parser::Parser::new(
        path.to_string_lossy().into_owned(),
        BufReader::new(file),
    );

    for command in commands {
        let command = command.map_err(|error| error.to_string())?;
        view.command(&command);
    }

    Ok(())
}

mod error_report {
    use ariadne::{Label, Report, ReportKind, Source};

    use crate::parser::JackParseError;

    pub fn display(file_path: &str, file_content: &str, errors: Vec<JackParseError>) {
        for error in errors {
            Report::build(ReportKind::Error, file_path, error.span().start)
                .with_message("Parser error")
                .with_label(
                    Label::new((file_path, error.span()))
                        .with_message(error.label().unwrap_or("error occured here")),
                )
                .finish()
                .eprint((file_path, Source::from(file_content)))
                .expect("error report should be valid");
        }
    }
}
