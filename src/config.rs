// Fixed schema and classification tables for RVTools exports.
//
// Nothing here is configurable at runtime: the column sets are the contract
// with the sheet extractor and the bucket tables drive host finalization.

/// File extensions (lowercase, without the dot) accepted as RVTools workbooks.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "xlsm"];

pub const VINFO_SHEET: &str = "vInfo";
pub const VHOST_SHEET: &str = "vHost";
pub const VMETADATA_SHEET: &str = "vMetaData";

pub const COL_VM: &str = "VM";
pub const COL_POWERSTATE: &str = "Powerstate";
pub const COL_CONNECTION_STATE: &str = "Connection state";
pub const COL_CPUS: &str = "CPUs";
pub const COL_MEMORY: &str = "Memory";
pub const COL_RESOURCE_POOL: &str = "Resource pool";
pub const COL_PROVISIONED_MIB: &str = "Provisioned MiB";
pub const COL_DATACENTER: &str = "Datacenter";
pub const COL_CLUSTER: &str = "Cluster";
pub const COL_HOST: &str = "Host";
pub const COL_OS_CONFIG: &str = "OS according to the configuration file";
pub const COL_OS_TOOLS: &str = "OS according to the VMware Tools";
pub const COL_VI_SDK_SERVER: &str = "VI SDK Server";
pub const COL_OS_CLASSIFICATION: &str = "OS Classification";

pub const COL_NUM_CPU: &str = "# CPU";
pub const COL_NUM_CORES: &str = "# Cores";
pub const COL_CPU_USAGE: &str = "CPU usage %";
pub const COL_NUM_MEMORY: &str = "# Memory";
pub const COL_MEMORY_USAGE: &str = "Memory usage %";
pub const COL_ESX_VERSION: &str = "ESX Version";
pub const COL_VENDOR: &str = "Vendor";
pub const COL_MODEL: &str = "Model";
pub const COL_CPU_BUCKET: &str = "CPU Utilization Bucket";
pub const COL_RAM_BUCKET: &str = "RAM Utilization Bucket";

pub const COL_SOURCE_FILE: &str = "SourceFile";
pub const COL_SOURCE_FILE_META: &str = "SourceFile_Meta";

/// Columns projected out of every vInfo sheet, in output order.
/// `OS Classification` is derived and therefore not listed here.
pub const REQUIRED_VINFO_COLS: [&str; 13] = [
    COL_VM,
    COL_POWERSTATE,
    COL_CONNECTION_STATE,
    COL_CPUS,
    COL_MEMORY,
    COL_RESOURCE_POOL,
    COL_PROVISIONED_MIB,
    COL_DATACENTER,
    COL_CLUSTER,
    COL_HOST,
    COL_OS_CONFIG,
    COL_OS_TOOLS,
    COL_VI_SDK_SERVER,
];

/// Columns projected out of every vHost sheet, in output order.
pub const REQUIRED_VHOST_COLS: [&str; 11] = [
    COL_HOST,
    COL_DATACENTER,
    COL_CLUSTER,
    COL_NUM_CPU,
    COL_NUM_CORES,
    COL_CPU_USAGE,
    COL_NUM_MEMORY,
    COL_MEMORY_USAGE,
    COL_ESX_VERSION,
    COL_VENDOR,
    COL_MODEL,
];

/// A half-open utilization band `[min, max)` and its display label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub min: f64,
    pub max: f64,
    pub label: &'static str,
}

pub const BUCKET_NA: &str = "N/A";

pub const CPU_BUCKETS: [Bucket; 4] = [
    Bucket { min: 0.0, max: 0.1, label: "1. 0-10%" },
    Bucket { min: 0.1, max: 0.2, label: "2. >10-20%" },
    Bucket { min: 0.2, max: 0.4, label: "3. >20-40%" },
    Bucket { min: 0.4, max: f64::INFINITY, label: "4. >40%+" },
];

pub const RAM_BUCKETS: [Bucket; 5] = [
    Bucket { min: 0.0, max: 0.2, label: "1. 0-20%" },
    Bucket { min: 0.2, max: 0.4, label: "2. >20-40%" },
    Bucket { min: 0.4, max: 0.6, label: "3. >40-60%" },
    Bucket { min: 0.6, max: 0.8, label: "4. >60-80%" },
    Bucket { min: 0.8, max: f64::INFINITY, label: "5. >80%+" },
];

// OS keyword rules, matched against lowercased descriptors in this order.
pub const SERVER_KEYWORDS: [&str; 4] = ["server", "rhel", "centos", "debian"];
pub const DESKTOP_KEYWORDS: [&str; 5] = ["desktop", "windows 10", "windows 11", "windows 7", "mac"];
pub const WINDOWS_KEYWORDS: [&str; 1] = ["windows"];
pub const LINUX_KEYWORDS: [&str; 1] = ["linux"];

// Output artifacts.
pub const CONSOLIDATED_WORKBOOK: &str = "RVTools_Consolidated_Report.xlsx";
pub const SUMMARY_REPORT: &str = "summary_report.txt";
pub const MANIFEST_FILE: &str = "rvtool_manifest.json";
pub const REPORTS_DIR: &str = "reports";

pub const SHEET_CONSOLIDATED_VINFO: &str = "Consolidated_vInfo";
pub const SHEET_CONSOLIDATED_VHOST: &str = "Consolidated_vHost";
pub const SHEET_CONSOLIDATED_METADATA: &str = "Consolidated_vMetaData";

/// How many clusters the cluster distribution keeps.
pub const TOP_CLUSTERS: usize = 10;
