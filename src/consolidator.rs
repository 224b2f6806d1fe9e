// Folder-level consolidation: discover workbooks, extract each one, append
// the rows in file order, then finalize the host table once.
use crate::classify::{cpu_bucket, ram_bucket};
use crate::config::SUPPORTED_EXTENSIONS;
use crate::error::ExtractError;
use crate::extractor::{extract_file, ExcelWorkbook, FileExtract};
use crate::types::{ConsolidatedData, FileProgress, ProcessingResult};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Owns the consolidated tables of a run. Every `process_folder` call starts
/// from empty tables, so repeated runs never see each other's rows.
#[derive(Debug, Default)]
pub struct Consolidator {
    data: ConsolidatedData,
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Supported workbooks directly inside `dir`, sorted by path.
pub fn find_workbooks(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn extract_path(path: &Path, source_file: &str) -> Result<FileExtract, ExtractError> {
    let mut workbook = ExcelWorkbook::open(path)?;
    extract_file(&mut workbook, source_file)
}

impl Consolidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_folder(&mut self, dir: &Path) -> ProcessingResult {
        self.process_folder_with_progress(dir, |_| {})
    }

    /// Process every supported workbook in `dir`.
    ///
    /// `progress` is called before each file and once when the run completes.
    /// A failing file is recorded in `errors` and the next file is attempted.
    pub fn process_folder_with_progress<F>(&mut self, dir: &Path, mut progress: F) -> ProcessingResult
    where
        F: FnMut(FileProgress),
    {
        info!("Starting folder processing: {}", dir.display());
        self.data = ConsolidatedData::default();

        if !dir.is_dir() {
            let msg = format!("Folder not found: {}", dir.display());
            error!("{}", msg);
            return ProcessingResult::critical(msg);
        }

        let files = match find_workbooks(dir) {
            Ok(files) => files,
            Err(e) => {
                let msg = format!("Critical error: {}", e);
                error!("{}", msg);
                return ProcessingResult::critical(msg);
            }
        };
        info!("Found {} Excel files", files.len());
        if files.is_empty() {
            return ProcessingResult::failure("No Excel files found in the specified folder");
        }

        let mut result = ProcessingResult {
            success: true,
            files_found: files.len(),
            ..Default::default()
        };

        for (i, path) in files.iter().enumerate() {
            let name = file_label(path);
            progress(FileProgress {
                percent: (i * 100 / files.len()) as u8,
                message: format!("Processing {}", name),
            });
            info!("Processing file: {}", name);

            match extract_path(path, &name) {
                Ok(extract) => {
                    let (vms, hosts) = self.append(extract);
                    result.vms_processed += vms;
                    result.hosts_processed += hosts;
                    result.files_processed += 1;
                }
                Err(e) => {
                    let msg = format!("Error processing {}: {}", name, e);
                    error!("{}", msg);
                    result.errors.push(msg);
                }
            }
        }

        self.finalize();
        progress(FileProgress {
            percent: 100,
            message: "Processing complete".to_string(),
        });

        result.message = format!("Successfully processed {} files", result.files_processed);
        info!(
            files = result.files_processed,
            vms = result.vms_processed,
            hosts = result.hosts_processed,
            errors = result.errors.len(),
            "{}",
            result.message
        );
        result
    }

    /// Append one file's tables; returns the VM and host rows added.
    fn append(&mut self, extract: FileExtract) -> (usize, usize) {
        let mut added = (0, 0);
        if let Some(vms) = extract.vinfo {
            added.0 = vms.len();
            self.data.vinfo.extend(vms);
        }
        if let Some(hosts) = extract.vhost {
            added.1 = hosts.len();
            self.data.vhost.extend(hosts);
        }
        if let Some((headers, rows)) = extract.metadata {
            if !rows.is_empty() {
                self.data.metadata.append(&headers, rows);
            }
        }
        added
    }

    /// Label every host with its CPU and RAM utilization bucket.
    fn finalize(&mut self) {
        for host in &mut self.data.vhost {
            host.cpu_bucket = Some(cpu_bucket(host.cpu_usage));
            host.ram_bucket = Some(ram_bucket(host.memory_usage));
        }
        info!("Post-processing completed");
    }

    pub fn get_consolidated_data(&self) -> &ConsolidatedData {
        &self.data
    }

    pub fn into_consolidated_data(self) -> ConsolidatedData {
        self.data
    }
}
