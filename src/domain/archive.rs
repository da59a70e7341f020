use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Package a directory of transcript files into a single deflate zip.
/// Entry names are relative to `folder`, so the archive unpacks to a flat
/// (or lightly nested) directory of UTF-8 text files.
pub fn create_zip(folder: &Path, zip_path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
    let file = File::create(zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    add_dir(&mut writer, folder, folder, options)?;
    writer.finish()?;
    Ok(())
}

fn add_dir(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: FileOptions,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            add_dir(writer, root, &path, options)?;
        } else {
            let arcname = path
                .strip_prefix(root)?
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            writer.start_file(arcname, options)?;
            writer.write_all(&std::fs::read(&path)?)?;
        }
    }
    Ok(())
}
