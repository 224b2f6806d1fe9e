// Rule-based classification over the static tables in `config`.
use crate::config::{
    Bucket, BUCKET_NA, CPU_BUCKETS, DESKTOP_KEYWORDS, LINUX_KEYWORDS, RAM_BUCKETS,
    SERVER_KEYWORDS, WINDOWS_KEYWORDS,
};
use crate::types::OsClass;

/// Classify a VM from its configured and VMware Tools OS descriptors.
///
/// First match wins: server keywords, desktop keywords, bare "windows",
/// bare "linux". Two empty descriptors mean no OS information at all.
pub fn classify_os(os_config: &str, os_tools: &str) -> OsClass {
    let config = os_config.to_lowercase();
    let tools = os_tools.to_lowercase();
    let mentions = |keywords: &[&str]| {
        keywords
            .iter()
            .any(|k| config.contains(k) || tools.contains(k))
    };

    if mentions(&SERVER_KEYWORDS[..]) {
        OsClass::Server
    } else if mentions(&DESKTOP_KEYWORDS[..]) {
        OsClass::Desktop
    } else if mentions(&WINDOWS_KEYWORDS[..]) {
        OsClass::WindowsUnspecified
    } else if mentions(&LINUX_KEYWORDS[..]) {
        OsClass::LinuxUnspecified
    } else if config.is_empty() && tools.is_empty() {
        OsClass::Unknown
    } else {
        OsClass::Other
    }
}

/// Label of the first `[min, max)` band containing `usage`, or `N/A`.
pub fn bucket_for(buckets: &[Bucket], usage: Option<f64>) -> &'static str {
    let Some(usage) = usage else {
        return BUCKET_NA;
    };
    buckets
        .iter()
        .find(|b| b.min <= usage && usage < b.max)
        .map(|b| b.label)
        .unwrap_or(BUCKET_NA)
}

pub fn cpu_bucket(usage: Option<f64>) -> &'static str {
    bucket_for(&CPU_BUCKETS, usage)
}

pub fn ram_bucket(usage: Option<f64>) -> &'static str {
    bucket_for(&RAM_BUCKETS, usage)
}
