mod common;

use calamine::{open_workbook_auto, Reader};
use common::{
    branch_office_inventory, close, datacenter_inventory, init_tracing, n, t, write_xlsx, E,
};
use rvtools_report::config::{
    CONSOLIDATED_WORKBOOK, MANIFEST_FILE, REPORTS_DIR, SHEET_CONSOLIDATED_METADATA,
    SHEET_CONSOLIDATED_VHOST, SHEET_CONSOLIDATED_VINFO, SUMMARY_REPORT,
};
use rvtools_report::reports::{self, CLUSTER_CSV, HEATMAP_CSV, POWER_STATE_CSV};
use rvtools_report::types::{CellValue, OsClass};
use rvtools_report::{
    build_reports, compute_metrics, read_manifest_metrics, run_pipeline, Consolidator,
    DashboardMetrics,
};
use std::fs;
use std::path::Path;

fn folder_with(files: &[(&str, Vec<(&'static str, Vec<Vec<CellValue>>)>)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, sheets) in files {
        write_xlsx(&dir.path().join(name), sheets);
    }
    dir
}

#[test]
fn single_inventory_end_to_end() {
    init_tracing();
    let input = folder_with(&[("dc1.xlsx", datacenter_inventory())]);

    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder(input.path());
    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Successfully processed 1 files");
    assert_eq!(result.files_found, 1);
    assert_eq!(result.files_processed, 1);
    assert_eq!(result.vms_processed, 5);
    assert_eq!(result.hosts_processed, 3);
    assert!(result.errors.is_empty());

    let data = consolidator.get_consolidated_data();
    assert_eq!(data.vinfo.len(), 5);
    assert_eq!(data.vinfo[0].vm, t("web01"));
    assert_eq!(data.vinfo[0].source_file, "dc1.xlsx");
    let classes: Vec<OsClass> = data.vinfo.iter().map(|v| v.os_classification).collect();
    assert_eq!(
        classes,
        vec![
            OsClass::Server,
            OsClass::LinuxUnspecified,
            OsClass::Server,
            OsClass::Desktop,
            OsClass::Unknown,
        ]
    );

    let cpu: Vec<Option<&str>> = data.vhost.iter().map(|h| h.cpu_bucket).collect();
    assert_eq!(cpu, vec![Some("3. >20-40%"), Some("2. >10-20%"), Some("N/A")]);
    let ram: Vec<Option<&str>> = data.vhost.iter().map(|h| h.ram_bucket).collect();
    assert_eq!(ram, vec![Some("2. >20-40%"), Some("1. 0-20%"), Some("5. >80%+")]);
    assert_eq!(data.vhost[2].cpu_usage, None);

    assert_eq!(data.metadata.len(), 1);
    assert_eq!(data.metadata.columns[0], "SourceFile_Meta");

    let m = compute_metrics(&data.vinfo, &data.vhost);
    assert_eq!(m.total_vms_all, 5);
    assert_eq!(m.total_powered_on_vms, 4);
    assert_eq!(m.total_vcpus, 18);
    assert!(close(m.avg_vcpus_per_vm, 4.5));
    assert!(close(m.total_ram_gb_vms, 36.0));
    assert!(close(m.avg_ram_gb_per_vm, 9.0));
    assert!(close(m.total_provisioned_gb, 120.0));
    assert!(close(m.avg_provisioned_gb_per_vm, 30.0));
    assert_eq!(m.total_hosts, 3);
    assert!(close(m.total_physical_cores, 84.0));
    assert!(close(m.avg_cores_per_host, 28.0));
    assert!(close(m.avg_sockets_per_host, 2.0));
    assert!(close(m.total_host_ram_gb, 1024.0));
    assert!(close(m.avg_ram_gb_per_host, 1024.0 / 3.0));
    assert!(close(m.avg_cpu_utilization, 0.225));
    assert!(close(m.avg_ram_utilization, (0.35 + 0.0999 + 0.8) / 3.0));
    assert!(close(m.vcpu_to_pcore_ratio, 18.0 / 84.0));
}

#[test]
fn one_corrupt_file_does_not_stop_the_run() {
    init_tracing();
    let input = folder_with(&[
        ("a_dc1.xlsx", datacenter_inventory()),
        ("b_branch.xlsx", branch_office_inventory()),
        ("c_dc1_copy.xlsx", datacenter_inventory()),
    ]);
    fs::write(input.path().join("d_broken.xlsx"), b"PK\x03\x04 truncated").unwrap();
    fs::write(input.path().join("notes.txt"), "not a workbook").unwrap();

    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder(input.path());
    assert!(result.success);
    assert_eq!(result.files_found, 4);
    assert_eq!(result.files_processed, 3);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Error processing d_broken.xlsx"));
    assert_eq!(result.vms_processed, 12);
    assert_eq!(result.hosts_processed, 7);

    let data = consolidator.get_consolidated_data();
    assert_eq!(data.vinfo.len(), 12);
    assert_eq!(data.vhost.len(), 7);
    assert!(data.vinfo.iter().all(|v| v.source_file != "d_broken.xlsx"));
    let sources: Vec<&str> = data.vinfo.iter().map(|v| v.source_file.as_str()).collect();
    assert_eq!(sources[5], "b_branch.xlsx");
    assert_eq!(sources[7], "c_dc1_copy.xlsx");
}

#[test]
fn reprocessing_the_same_folder_is_idempotent() {
    init_tracing();
    let input = folder_with(&[
        ("dc1.xlsx", datacenter_inventory()),
        ("branch.xlsx", branch_office_inventory()),
    ]);

    let mut consolidator = Consolidator::new();
    let first = consolidator.process_folder(input.path());
    let first_data = consolidator.get_consolidated_data().clone();
    let second = consolidator.process_folder(input.path());
    assert_eq!(first, second);
    assert_eq!(&first_data, consolidator.get_consolidated_data());
    assert_eq!(consolidator.get_consolidated_data().vinfo.len(), 7);
}

#[test]
fn metrics_do_not_depend_on_file_order() {
    init_tracing();
    let forward = folder_with(&[
        ("1.xlsx", datacenter_inventory()),
        ("2.xlsx", branch_office_inventory()),
    ]);
    let reversed = folder_with(&[
        ("1.xlsx", branch_office_inventory()),
        ("2.xlsx", datacenter_inventory()),
    ]);

    let metrics_of = |dir: &Path| {
        let mut c = Consolidator::new();
        assert!(c.process_folder(dir).success);
        let data = c.into_consolidated_data();
        compute_metrics(&data.vinfo, &data.vhost)
    };
    let a = metrics_of(forward.path());
    let b = metrics_of(reversed.path());

    assert_eq!(a.total_vms_all, b.total_vms_all);
    assert_eq!(a.total_powered_on_vms, 5);
    assert_eq!(a.total_vcpus, 20);
    assert_eq!(a.total_vcpus, b.total_vcpus);
    assert_eq!(a.total_hosts, b.total_hosts);
    assert!(close(a.total_physical_cores, 92.0));
    assert!(close(a.total_physical_cores, b.total_physical_cores));
    assert!(close(a.avg_ram_gb_per_vm, b.avg_ram_gb_per_vm));
    assert!(close(a.avg_cpu_utilization, b.avg_cpu_utilization));
    assert!(close(a.avg_ram_utilization, b.avg_ram_utilization));
    assert!(close(a.vcpu_to_pcore_ratio, b.vcpu_to_pcore_ratio));
    assert!(close(a.vcpu_to_pcore_ratio, 20.0 / 92.0));
}

#[test]
fn workbook_without_known_sheets_counts_as_processed() {
    init_tracing();
    let input = folder_with(&[
        ("dc1.xlsx", datacenter_inventory()),
        ("other.xlsx", vec![("Sheet1", vec![vec![t("hello")]])]),
    ]);

    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder(input.path());
    assert!(result.success);
    assert_eq!(result.files_processed, 2);
    assert!(result.errors.is_empty());
    assert_eq!(result.vms_processed, 5);
}

#[test]
fn missing_columns_yield_zero_metrics_without_errors() {
    init_tracing();
    let vinfo = vec![
        vec![t("VM"), t("Powerstate")],
        vec![t("a"), t("poweredOn")],
        vec![t("b"), t("poweredOn")],
    ];
    let vhost = vec![vec![t("Host"), t("# Cores")], vec![t("esx"), n(16.0)], vec![E, E]];
    let input = folder_with(&[("thin.xlsx", vec![("vInfo", vinfo), ("vHost", vhost)])]);

    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder(input.path());
    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.hosts_processed, 1);

    let data = consolidator.get_consolidated_data();
    let m = compute_metrics(&data.vinfo, &data.vhost);
    assert_eq!(m.total_powered_on_vms, 2);
    assert_eq!(m.total_vcpus, 0);
    assert_eq!(m.avg_vcpus_per_vm, 0.0);
    assert!(close(m.total_physical_cores, 16.0));
    assert_eq!(m.vcpu_to_pcore_ratio, 0.0);
    assert_eq!(m.avg_cpu_utilization, 0.0);
    assert_eq!(data.vhost[0].cpu_bucket, Some("N/A"));
}

#[test]
fn pipeline_writes_every_artifact() {
    init_tracing();
    let input = folder_with(&[
        ("dc1.xlsx", datacenter_inventory()),
        ("branch.xlsx", branch_office_inventory()),
    ]);
    let output = tempfile::tempdir().unwrap();

    let manifest = run_pipeline(input.path(), output.path());
    assert!(manifest.is_success(), "{:?}", manifest.message);
    assert_eq!(manifest.files_processed, 2);
    assert_eq!(manifest.vms_processed, 7);
    assert_eq!(manifest.hosts_processed, 4);
    let metrics = manifest.metrics.unwrap();
    assert_eq!(metrics.total_vcpus, 20);

    let stored = read_manifest_metrics(&output.path().join(MANIFEST_FILE)).unwrap();
    assert_eq!(stored.total_vcpus, metrics.total_vcpus);
    assert_eq!(stored.total_hosts, metrics.total_hosts);
    assert!(close(stored.vcpu_to_pcore_ratio, metrics.vcpu_to_pcore_ratio));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join(MANIFEST_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["status"], "success");
    assert!(json["output_files"]["excel_report"]
        .as_str()
        .unwrap()
        .ends_with(CONSOLIDATED_WORKBOOK));

    let mut workbook = open_workbook_auto(output.path().join(CONSOLIDATED_WORKBOOK)).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![
            SHEET_CONSOLIDATED_VINFO.to_string(),
            SHEET_CONSOLIDATED_VHOST.to_string(),
            SHEET_CONSOLIDATED_METADATA.to_string(),
        ]
    );
    let vinfo = workbook.worksheet_range(SHEET_CONSOLIDATED_VINFO).unwrap();
    assert_eq!(vinfo.height(), 8);
    let vhost = workbook.worksheet_range(SHEET_CONSOLIDATED_VHOST).unwrap();
    assert_eq!(vhost.height(), 5);
    assert_eq!(vhost.width(), 14);

    let summary = fs::read_to_string(output.path().join(SUMMARY_REPORT)).unwrap();
    assert!(summary.contains("Total VMs (Powered On) | 5 |"));
    assert!(summary.contains("Total Hosts (Visible) | 4 |"));

    let reports_dir = output.path().join(REPORTS_DIR);
    for name in [POWER_STATE_CSV, CLUSTER_CSV, HEATMAP_CSV] {
        assert!(reports_dir.join(name).is_file(), "missing {}", name);
    }
    let power = fs::read_to_string(reports_dir.join(POWER_STATE_CSV)).unwrap();
    assert!(power.lines().nth(1).unwrap().starts_with("poweredOn,5,"));
}

#[test]
fn pipeline_reports_folder_without_workbooks() {
    init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let manifest = run_pipeline(input.path(), output.path());
    assert_eq!(manifest.status, "error");
    assert_eq!(
        manifest.message.as_deref(),
        Some("No Excel files found in the specified folder")
    );
    assert!(manifest.metrics.is_none());
    assert!(read_manifest_metrics(&reports::manifest_path(output.path())).is_none());
}

#[test]
fn empty_sheets_still_produce_a_workbook() {
    init_tracing();
    let input = folder_with(&[(
        "empty.xlsx",
        vec![("vInfo", vec![vec![t("VM")]]), ("vHost", vec![vec![t("Host")]])],
    )]);

    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder(input.path());
    assert!(result.success);
    let data = consolidator.get_consolidated_data();
    assert!(data.vinfo.is_empty());

    let bundle = build_reports(data);
    assert_eq!(bundle.metrics, DashboardMetrics::default());

    let output = tempfile::tempdir().unwrap();
    let manifest = reports::write_reports(&bundle, data, &result, output.path()).unwrap();
    assert!(manifest.is_success());
    let workbook = open_workbook_auto(output.path().join(CONSOLIDATED_WORKBOOK)).unwrap();
    assert_eq!(workbook.sheet_names().len(), 2);
}
