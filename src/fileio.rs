//! Code regarding file input (reading source `.jack` and `.vm` files)
//! and output (writing generated `.vm` and `.asm` files).
//!
//! Inputs may be a single file or a directory; directories are walked
//! recursively and the discovered sources are sorted, so multi-file
//! translation order (and with it label numbering) is deterministic.

pub mod input {
    use std::{
        fs, io,
        path::{Path, PathBuf},
    };

    pub struct SourceFile {
        short_name: String,
        content: String,
    }

    impl SourceFile {
        pub fn load(path: &Path) -> io::Result<Self> {
            Ok(Self {
                short_name: short_name(path),
                content: fs::read_to_string(path)?,
            })
        }

        /// File stem: drives the output file name and, for `.vm`
        /// inputs, static segment naming.
        pub fn short_name(&self) -> &str {
            &self.short_name
        }

        pub fn content(&self) -> &str {
            &self.content
        }
    }

    pub fn short_name(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[cfg(test)]
    impl SourceFile {
        pub fn from_parts(short_name: &str, content: &str) -> Self {
            Self {
                short_name: short_name.to_string(),
                content: content.to_string(),
            }
        }
    }

    /// Collect every file with the given extension under `input`,
    /// in sorted order.
    pub fn collect_sources(input: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        let mut sources = Vec::new();

        if input.is_dir() {
            visit(input, extension, &mut sources)?;
        } else if has_extension(input, extension) {
            sources.push(input.to_path_buf());
        }

        if sources.is_empty() {
            return Err(io::Error::other(format!(
                "no .{extension} file found in `{}`",
                input.display()
            )));
        }

        sources.sort();
        Ok(sources)
    }

    pub fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension().is_some_and(|e| e == extension)
    }

    fn visit(dir: &Path, extension: &str, sources: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                visit(&path, extension, sources)?;
            } else if has_extension(&path, extension) {
                sources.push(path);
            }
        }

        Ok(())
    }
}

pub mod output {
    use std::{
        fs, io,
        path::{Path, PathBuf},
    };

    pub struct OutputFile {
        name: String,
        content: String,
    }

    impl OutputFile {
        pub const fn new(name: String, content: String) -> Self {
            Self { name, content }
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn content(&self) -> &str {
            &self.content
        }
    }

    /// Write `{name}.vm` into the output directory, creating the
    /// directory if needed. A partially written file is removed.
    pub fn generate(out_dir: &Path, output_file: &OutputFile) -> io::Result<PathBuf> {
        fs::create_dir_all(out_dir)?;

        let path = out_dir.join(output_file.name()).with_extension("vm");

        let mut content = output_file.content().to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }

        if let Err(error) = fs::write(&path, content) {
            remove_partial(&path);
            return Err(error);
        }

        Ok(path)
    }

    /// Best-effort cleanup of an output that failed mid-write;
    /// the original error stays the one reported.
    pub fn remove_partial(path: &Path) {
        let _ = fs::remove_file(path);
    }
}
