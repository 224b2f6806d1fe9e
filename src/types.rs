use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tabled::Tabled;

/// A single spreadsheet cell as read from a workbook.
///
/// `Empty` is the "missing" marker: absent columns, blank cells and cells
/// that could not be represented all end up here and are excluded from
/// aggregates rather than counted as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The string payload, only for text cells.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render the cell the way a spreadsheet would show it; `Empty` is `""`.
    pub fn to_display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Operating system family derived from the two vInfo OS descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OsClass {
    Server,
    Desktop,
    WindowsUnspecified,
    LinuxUnspecified,
    Unknown,
    Other,
}

impl OsClass {
    pub fn label(self) -> &'static str {
        match self {
            OsClass::Server => "Server",
            OsClass::Desktop => "Desktop",
            OsClass::WindowsUnspecified => "Windows (Unspecified)",
            OsClass::LinuxUnspecified => "Linux (Unspecified)",
            OsClass::Unknown => "Unknown / No OS Info",
            OsClass::Other => "Other",
        }
    }
}

impl fmt::Display for OsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OsClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One virtual machine from a vInfo sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmRow {
    pub vm: CellValue,
    pub powerstate: CellValue,
    pub connection_state: CellValue,
    pub cpus: CellValue,
    pub memory: CellValue,
    pub resource_pool: CellValue,
    pub provisioned_mib: CellValue,
    pub datacenter: CellValue,
    pub cluster: CellValue,
    pub host: CellValue,
    pub os_config: CellValue,
    pub os_tools: CellValue,
    pub vi_sdk_server: CellValue,
    pub os_classification: OsClass,
    pub source_file: String,
}

impl VmRow {
    /// `Powerstate` equals `poweredOn`, ignoring case.
    pub fn is_powered_on(&self) -> bool {
        self.powerstate
            .as_text()
            .map(|s| s.to_lowercase() == "poweredon")
            .unwrap_or(false)
    }

    /// Cells in consolidated export order (required columns, classification, source).
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            self.vm.clone(),
            self.powerstate.clone(),
            self.connection_state.clone(),
            self.cpus.clone(),
            self.memory.clone(),
            self.resource_pool.clone(),
            self.provisioned_mib.clone(),
            self.datacenter.clone(),
            self.cluster.clone(),
            self.host.clone(),
            self.os_config.clone(),
            self.os_tools.clone(),
            self.vi_sdk_server.clone(),
            CellValue::Text(self.os_classification.label().to_string()),
            CellValue::Text(self.source_file.clone()),
        ]
    }
}

/// One physical host from a vHost sheet.
///
/// `cpu_usage` and `memory_usage` are normalized fractions in `[0, 1]`.
/// The bucket labels stay `None` until the consolidator finalizes the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRow {
    pub host: CellValue,
    pub datacenter: CellValue,
    pub cluster: CellValue,
    pub num_cpu: CellValue,
    pub num_cores: CellValue,
    pub cpu_usage: Option<f64>,
    pub num_memory: CellValue,
    pub memory_usage: Option<f64>,
    pub esx_version: CellValue,
    pub vendor: CellValue,
    pub model: CellValue,
    pub source_file: String,
    pub cpu_bucket: Option<&'static str>,
    pub ram_bucket: Option<&'static str>,
}

impl HostRow {
    pub fn to_cells(&self) -> Vec<CellValue> {
        let usage = |v: Option<f64>| v.map(CellValue::Number).unwrap_or_default();
        let label = |v: Option<&'static str>| v.map(CellValue::from).unwrap_or_default();
        vec![
            self.host.clone(),
            self.datacenter.clone(),
            self.cluster.clone(),
            self.num_cpu.clone(),
            self.num_cores.clone(),
            usage(self.cpu_usage),
            self.num_memory.clone(),
            usage(self.memory_usage),
            self.esx_version.clone(),
            self.vendor.clone(),
            self.model.clone(),
            CellValue::Text(self.source_file.clone()),
            label(self.cpu_bucket),
            label(self.ram_bucket),
        ]
    }
}

/// One free-form vMetaData row. No schema: header name to cell text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetadataRow {
    pub source_file: String,
    pub values: HashMap<String, String>,
}

/// Consolidated metadata: rows plus the union of headers in first-seen order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetadataTable {
    pub columns: Vec<String>,
    pub rows: Vec<MetadataRow>,
}

impl MetadataTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Append one file's metadata, extending the column union as needed.
    pub fn append(&mut self, headers: &[String], rows: Vec<MetadataRow>) {
        for h in headers {
            if !self.columns.iter().any(|c| c == h) {
                self.columns.push(h.clone());
            }
        }
        self.rows.extend(rows);
    }
}

/// The three consolidated tables of one processing run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConsolidatedData {
    pub vinfo: Vec<VmRow>,
    pub vhost: Vec<HostRow>,
    pub metadata: MetadataTable,
}

/// Outcome of `Consolidator::process_folder`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub message: String,
    /// Matching files discovered in the folder; every one of them is attempted.
    pub files_found: usize,
    /// Files that were read without error.
    pub files_processed: usize,
    pub vms_processed: usize,
    pub hosts_processed: usize,
    pub errors: Vec<String>,
}

impl ProcessingResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    /// A run-level failure caused by an error, which is also recorded in `errors`.
    pub fn critical(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            errors: vec![message.clone()],
            ..Self::failure(message)
        }
    }
}

/// Progress notification passed to the optional callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProgress {
    pub percent: u8,
    pub message: String,
}

/// Aggregate infrastructure metrics over the consolidated tables.
///
/// Every field defaults to zero; the engine never leaves one undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    // Overall counts
    pub total_powered_on_vms: usize,
    pub total_vms_all: usize,
    pub total_hosts: usize,

    // Host resources
    pub total_physical_cores: f64,
    pub avg_cores_per_host: f64,
    pub avg_sockets_per_host: f64,
    pub avg_ram_gb_per_host: f64,

    // Powered-on VM resources
    pub avg_vcpus_per_vm: f64,
    pub avg_ram_gb_per_vm: f64,
    pub avg_provisioned_gb_per_vm: f64,

    // Utilization & ratios
    pub vcpu_to_pcore_ratio: f64,
    pub avg_cpu_utilization: f64,
    pub avg_ram_utilization: f64,

    // Totals
    pub total_vcpus: i64,
    pub total_ram_gb_vms: f64,
    pub total_provisioned_gb: f64,
    pub total_host_ram_gb: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DistributionRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
}

/// Host counts for one RAM bucket, split by CPU bucket.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct HeatmapRow {
    #[serde(rename = "RAM Utilization Bucket")]
    #[tabled(rename = "RAM Bucket")]
    pub ram_bucket: String,
    #[serde(rename = "1. 0-10%")]
    #[tabled(rename = "1. 0-10%")]
    pub cpu_0_10: usize,
    #[serde(rename = "2. >10-20%")]
    #[tabled(rename = "2. >10-20%")]
    pub cpu_10_20: usize,
    #[serde(rename = "3. >20-40%")]
    #[tabled(rename = "3. >20-40%")]
    pub cpu_20_40: usize,
    #[serde(rename = "4. >40%+")]
    #[tabled(rename = "4. >40%+")]
    pub cpu_40_plus: usize,
    #[serde(rename = "N/A")]
    #[tabled(rename = "N/A")]
    pub cpu_na: usize,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct OsResourceRow {
    #[serde(rename = "OS Classification")]
    #[tabled(rename = "OS Classification")]
    pub os_classification: String,
    #[serde(rename = "PoweredOnVMs")]
    #[tabled(rename = "PoweredOnVMs")]
    pub vms: usize,
    #[serde(rename = "AvgVCPUs")]
    #[tabled(rename = "AvgVCPUs")]
    pub avg_vcpus: String,
    #[serde(rename = "AvgMemoryGB")]
    #[tabled(rename = "AvgMemoryGB")]
    pub avg_memory_gb: String,
    #[serde(rename = "AvgProvisionedGB")]
    #[tabled(rename = "AvgProvisionedGB")]
    pub avg_provisioned_gb: String,
}

/// One `Label | Value | Calculation` line of the summary report.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MetricLine {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Calculation")]
    pub calculation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummarySection {
    pub title: &'static str,
    pub lines: Vec<MetricLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub excel_report: String,
    pub summary_report: String,
    pub reports_directory: String,
}

/// Machine-readable record of one pipeline run (`rvtool_manifest.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub status: String,
    pub processing_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub files_processed: usize,
    #[serde(default)]
    pub vms_processed: usize,
    #[serde(default)]
    pub hosts_processed: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DashboardMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_files: Option<OutputFiles>,
}

impl Manifest {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
