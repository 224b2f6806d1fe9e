use crate::classify::{cpu_bucket, ram_bucket};
use crate::config::{
    BUCKET_NA, CONSOLIDATED_WORKBOOK, CPU_BUCKETS, MANIFEST_FILE, RAM_BUCKETS, REPORTS_DIR,
    SUMMARY_REPORT, TOP_CLUSTERS,
};
use crate::consolidator::Consolidator;
use crate::error::OutputError;
use crate::metrics::compute_metrics;
use crate::output::{write_csv, write_json, write_text, write_workbook};
use crate::types::{
    CellValue, ConsolidatedData, DashboardMetrics, DistributionRow, HeatmapRow, HostRow, Manifest,
    MetricLine, OsClass, OsResourceRow, OutputFiles, ProcessingResult, SummarySection, VmRow,
};
use crate::util::{coerce_number, format_int, format_number, format_share, mean_present};
use chrono::Local;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const POWER_STATE_CSV: &str = "power_state_distribution.csv";
pub const OS_CLASSIFICATION_CSV: &str = "os_classification_distribution.csv";
pub const CLUSTER_CSV: &str = "top_clusters.csv";
pub const HEATMAP_CSV: &str = "host_utilization_heatmap.csv";
pub const OS_RESOURCES_CSV: &str = "resource_allocation_by_os.csv";

/// Everything derived from one set of consolidated tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    pub metrics: DashboardMetrics,
    pub power_states: Vec<DistributionRow>,
    pub os_classes: Vec<DistributionRow>,
    pub clusters: Vec<DistributionRow>,
    pub heatmap: Vec<HeatmapRow>,
    pub os_resources: Vec<OsResourceRow>,
    pub summary: Vec<SummarySection>,
}

fn label_or_blank(cell: &CellValue) -> String {
    let s = cell.to_display();
    if s.trim().is_empty() {
        "(blank)".to_string()
    } else {
        s
    }
}

/// Count rows per category, largest first, ties by name.
fn distribution<I>(categories: I, total: usize) -> Vec<DistributionRow>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for c in categories {
        *counts.entry(c).or_default() += 1;
    }
    let mut rows: Vec<(String, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.into_iter()
        .map(|(category, count)| DistributionRow {
            share: format_share(count, total),
            category,
            count,
        })
        .collect()
}

pub fn power_state_distribution(vinfo: &[VmRow]) -> Vec<DistributionRow> {
    distribution(vinfo.iter().map(|vm| label_or_blank(&vm.powerstate)), vinfo.len())
}

pub fn os_distribution(vinfo: &[VmRow]) -> Vec<DistributionRow> {
    distribution(
        vinfo.iter().map(|vm| vm.os_classification.label().to_string()),
        vinfo.len(),
    )
}

/// The `top` clusters by VM count.
pub fn cluster_distribution(vinfo: &[VmRow], top: usize) -> Vec<DistributionRow> {
    let mut rows = distribution(vinfo.iter().map(|vm| label_or_blank(&vm.cluster)), vinfo.len());
    rows.truncate(top);
    rows
}

/// Host counts cross-tabulated by RAM bucket (rows) and CPU bucket (columns).
///
/// Hosts that were never finalized are bucketed on the fly. Only RAM buckets
/// that hold at least one host get a row.
pub fn host_heatmap(vhost: &[HostRow]) -> Vec<HeatmapRow> {
    let mut grid: HashMap<&'static str, [usize; 5]> = HashMap::new();
    for h in vhost {
        let ram = h.ram_bucket.unwrap_or_else(|| ram_bucket(h.memory_usage));
        let cpu = h.cpu_bucket.unwrap_or_else(|| cpu_bucket(h.cpu_usage));
        let col = CPU_BUCKETS
            .iter()
            .position(|b| b.label == cpu)
            .unwrap_or(CPU_BUCKETS.len());
        grid.entry(ram).or_default()[col] += 1;
    }

    RAM_BUCKETS
        .iter()
        .map(|b| b.label)
        .chain(std::iter::once(BUCKET_NA))
        .filter_map(|label| {
            grid.get(label).map(|c| HeatmapRow {
                ram_bucket: label.to_string(),
                cpu_0_10: c[0],
                cpu_10_20: c[1],
                cpu_20_40: c[2],
                cpu_40_plus: c[3],
                cpu_na: c[4],
                total: c.iter().sum(),
            })
        })
        .collect()
}

/// Average allocation of powered-on VMs per OS classification.
pub fn os_resource_allocation(vinfo: &[VmRow]) -> Vec<OsResourceRow> {
    let mut groups: BTreeMap<OsClass, Vec<&VmRow>> = BTreeMap::new();
    for vm in vinfo.iter().filter(|vm| vm.is_powered_on()) {
        groups.entry(vm.os_classification).or_default().push(vm);
    }
    groups
        .into_iter()
        .map(|(os, vms)| {
            let gb = |cell: &CellValue| coerce_number(cell).map(|v| v / 1024.0);
            OsResourceRow {
                os_classification: os.label().to_string(),
                vms: vms.len(),
                avg_vcpus: format_number(mean_present(vms.iter().map(|v| coerce_number(&v.cpus))), 2),
                avg_memory_gb: format_number(mean_present(vms.iter().map(|v| gb(&v.memory))), 2),
                avg_provisioned_gb: format_number(
                    mean_present(vms.iter().map(|v| gb(&v.provisioned_mib))),
                    2,
                ),
            }
        })
        .collect()
}

fn line(metric: &str, value: String, calculation: &str) -> MetricLine {
    MetricLine {
        metric: metric.to_string(),
        value,
        calculation: calculation.to_string(),
    }
}

/// Summary report content: every metric with how it is calculated.
pub fn summary_sections(m: &DashboardMetrics) -> Vec<SummarySection> {
    vec![
        SummarySection {
            title: "Overall Counts",
            lines: vec![
                line(
                    "Total VMs (Powered On)",
                    format_int(m.total_powered_on_vms),
                    "Count of VMs from vInfo where 'Powerstate' is 'poweredOn'",
                ),
                line(
                    "Total VMs (All Visible)",
                    format_int(m.total_vms_all),
                    "Total count of VMs from vInfo",
                ),
                line(
                    "Total Hosts (Visible)",
                    format_int(m.total_hosts),
                    "Total count of hosts from vHost",
                ),
            ],
        },
        SummarySection {
            title: "Host Resources (Aggregates & Averages)",
            lines: vec![
                line(
                    "Total Physical Cores (Visible Hosts)",
                    format_number(m.total_physical_cores, 0),
                    "Sum of '# Cores' from vHost rows",
                ),
                line(
                    "Physical Cores per Host (Avg)",
                    format!("{:.2}", m.avg_cores_per_host),
                    "Total Physical Cores / Total Hosts",
                ),
                line(
                    "CPUs (Sockets) per Host (Avg)",
                    format!("{:.2}", m.avg_sockets_per_host),
                    "Average of '# CPU' (sockets) from hosts",
                ),
                line(
                    "RAM (GB) per Host (Avg)",
                    format!("{:.2}", m.avg_ram_gb_per_host),
                    "(Sum '# Memory' MB / 1024) / Total Hosts",
                ),
            ],
        },
        SummarySection {
            title: "VM Resources (PoweredOn VM Averages)",
            lines: vec![
                line(
                    "vCPUs per VM (Avg)",
                    format!("{:.2}", m.avg_vcpus_per_vm),
                    "Total vCPUs / Total Powered On VMs",
                ),
                line(
                    "GB RAM per VM (Avg)",
                    format!("{:.2}", m.avg_ram_gb_per_vm),
                    "(Sum 'Memory' MiB / 1024) / Total Powered On VMs",
                ),
                line(
                    "Avg Provisioned Storage (GB) per VM",
                    format!("{:.2}", m.avg_provisioned_gb_per_vm),
                    "(Sum 'Provisioned MiB' / 1024) / Total Powered On VMs",
                ),
            ],
        },
        SummarySection {
            title: "Utilization & Ratios",
            lines: vec![
                line(
                    "vCPU to pCore ratio",
                    format!("{:.2}", m.vcpu_to_pcore_ratio),
                    "Total vCPUs (Powered On VMs) / Total Physical Cores",
                ),
                line(
                    "CPU Utilization % (Host Avg)",
                    format!("{:.1}%", m.avg_cpu_utilization * 100.0),
                    "Average of 'CPU usage %' from hosts",
                ),
                line(
                    "RAM Utilization % (Host Avg)",
                    format!("{:.1}%", m.avg_ram_utilization * 100.0),
                    "Average of 'Memory usage %' from hosts",
                ),
                line(
                    "Threads/Core (Cluster Avg)",
                    "N/A (Requires vCluster data)".to_string(),
                    "vCluster data is not processed",
                ),
            ],
        },
        SummarySection {
            title: "Additional Calculated Totals",
            lines: vec![
                line(
                    "Total vCPUs (Powered On VMs)",
                    format_int(m.total_vcpus),
                    "Sum of vCPUs from all powered-on VMs",
                ),
                line(
                    "Total VM RAM (GB)",
                    format_number(m.total_ram_gb_vms, 2),
                    "Total memory allocated to all powered-on VMs",
                ),
                line(
                    "Total Provisioned Storage (GB)",
                    format_number(m.total_provisioned_gb, 2),
                    "Total storage provisioned for all powered-on VMs",
                ),
                line(
                    "Total Host RAM (GB)",
                    format_number(m.total_host_ram_gb, 2),
                    "Total physical memory across all hosts",
                ),
            ],
        },
    ]
}

pub fn render_summary(sections: &[SummarySection], generated_at: &str) -> String {
    let mut out = vec![
        "RVTools Infrastructure Summary Report".to_string(),
        "=".repeat(50),
        String::new(),
        "Category / Metric | Value | Calculation Logic / Notes".to_string(),
        "-".repeat(70),
        String::new(),
    ];
    for section in sections {
        out.push(format!("{}:", section.title));
        for l in &section.lines {
            out.push(format!("{} | {} | {}", l.metric, l.value, l.calculation));
        }
        out.push(String::new());
    }
    out.push(format!("Report generated on: {}", generated_at));
    out.join("\n")
}

pub fn build_reports(data: &ConsolidatedData) -> ReportBundle {
    let metrics = compute_metrics(&data.vinfo, &data.vhost);
    ReportBundle {
        metrics,
        power_states: power_state_distribution(&data.vinfo),
        os_classes: os_distribution(&data.vinfo),
        clusters: cluster_distribution(&data.vinfo, TOP_CLUSTERS),
        heatmap: host_heatmap(&data.vhost),
        os_resources: os_resource_allocation(&data.vinfo),
        summary: summary_sections(&metrics),
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn absolute(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

impl Manifest {
    pub fn error(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: "error".to_string(),
            processing_date: timestamp(),
            message: Some(message.into()),
            files_processed: 0,
            vms_processed: 0,
            hosts_processed: 0,
            errors,
            metrics: None,
            output_files: None,
        }
    }
}

/// Write the workbook, summary, data tables and manifest into `output_dir`.
pub fn write_reports(
    bundle: &ReportBundle,
    data: &ConsolidatedData,
    result: &ProcessingResult,
    output_dir: &Path,
) -> Result<Manifest, OutputError> {
    let reports_dir = output_dir.join(REPORTS_DIR);
    std::fs::create_dir_all(&reports_dir)?;

    let excel_path = output_dir.join(CONSOLIDATED_WORKBOOK);
    info!("Exporting consolidated data to: {}", excel_path.display());
    write_workbook(&excel_path, data)?;

    let summary_path = output_dir.join(SUMMARY_REPORT);
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    write_text(&summary_path, &render_summary(&bundle.summary, &generated_at))?;
    info!("Summary report saved to: {}", summary_path.display());

    let tables: [(&str, Result<(), OutputError>); 5] = [
        (POWER_STATE_CSV, write_csv(&reports_dir.join(POWER_STATE_CSV), &bundle.power_states)),
        (OS_CLASSIFICATION_CSV, write_csv(&reports_dir.join(OS_CLASSIFICATION_CSV), &bundle.os_classes)),
        (CLUSTER_CSV, write_csv(&reports_dir.join(CLUSTER_CSV), &bundle.clusters)),
        (HEATMAP_CSV, write_csv(&reports_dir.join(HEATMAP_CSV), &bundle.heatmap)),
        (OS_RESOURCES_CSV, write_csv(&reports_dir.join(OS_RESOURCES_CSV), &bundle.os_resources)),
    ];
    for (name, outcome) in tables {
        if let Err(e) = outcome {
            warn!("Could not write {}: {}", name, e);
        }
    }

    let manifest = Manifest {
        status: "success".to_string(),
        processing_date: timestamp(),
        message: None,
        files_processed: result.files_processed,
        vms_processed: result.vms_processed,
        hosts_processed: result.hosts_processed,
        errors: result.errors.clone(),
        metrics: Some(bundle.metrics),
        output_files: Some(OutputFiles {
            excel_report: absolute(&excel_path),
            summary_report: absolute(&summary_path),
            reports_directory: absolute(&reports_dir),
        }),
    };
    let manifest_path = output_dir.join(MANIFEST_FILE);
    write_json(&manifest_path, &manifest)?;
    info!("Manifest saved to: {}", manifest_path.display());
    Ok(manifest)
}

/// Process `input_dir` and write every report into `output_dir`.
///
/// Never fails outright: problems come back as an error-status manifest.
pub fn run_pipeline(input_dir: &Path, output_dir: &Path) -> Manifest {
    info!("Starting RVTools data processing");
    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder(input_dir);
    if !result.success {
        return Manifest::error(result.message, result.errors);
    }

    let data = consolidator.get_consolidated_data();
    let bundle = build_reports(data);
    match write_reports(&bundle, data, &result, output_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Error writing reports: {}", e);
            Manifest::error(format!("Processing failed: {}", e), result.errors)
        }
    }
}

/// Metrics stored in a previously written manifest, if it can be read.
pub fn read_manifest_metrics(path: &Path) -> Option<DashboardMetrics> {
    let text = std::fs::read_to_string(path).ok()?;
    let manifest: Manifest = serde_json::from_str(&text).ok()?;
    manifest.metrics
}

/// Default location of the manifest inside an output folder.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILE)
}
