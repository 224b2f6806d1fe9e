//! Shared helpers for the integration tests: logging setup and on-disk
//! RVTools workbook fixtures.

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use rvtools_report::types::CellValue;
use std::path::Path;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing once for all tests in a binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(filter)
            .init();
    });
}

pub fn t(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

pub fn n(v: f64) -> CellValue {
    CellValue::Number(v)
}

pub const E: CellValue = CellValue::Empty;

/// Write a workbook with the given sheets, top-left cell at A1.
pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<CellValue>>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        sheet.write_string(r, c, s.as_str()).unwrap();
                    }
                    CellValue::Number(v) => {
                        sheet.write_number(r, c, *v).unwrap();
                    }
                    CellValue::Bool(b) => {
                        sheet.write_boolean(r, c, *b).unwrap();
                    }
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

fn vinfo_header() -> Vec<CellValue> {
    [
        "VM",
        "Powerstate",
        "CPUs",
        "Memory",
        "Provisioned MiB",
        "Cluster",
        "OS according to the configuration file",
        "OS according to the VMware Tools",
    ]
    .iter()
    .map(|h| t(h))
    .collect()
}

fn vhost_header() -> Vec<CellValue> {
    ["Host", "Cluster", "# CPU", "# Cores", "CPU usage %", "# Memory", "Memory usage %"]
        .iter()
        .map(|h| t(h))
        .collect()
}

/// Five VMs (four powered on) behind two banner rows, three hosts and a
/// metadata sheet.
///
/// Powered-on vCPUs sum to 18 over 84 physical cores. Host utilization cells
/// exercise the percent-string, fraction and unparseable paths.
pub fn datacenter_inventory() -> Vec<(&'static str, Vec<Vec<CellValue>>)> {
    let vinfo = vec![
        vec![t("RVTools export 4.6.1")],
        vec![E],
        vinfo_header(),
        vec![
            t("web01"),
            t("poweredOn"),
            n(2.0),
            n(4096.0),
            n(10240.0),
            t("Prod"),
            t("Microsoft Windows Server 2019 (64-bit)"),
            E,
        ],
        vec![
            t("web02"),
            t("poweredOn"),
            n(4.0),
            n(8192.0),
            n(20480.0),
            t("Prod"),
            t("Ubuntu Linux (64-bit)"),
            E,
        ],
        vec![
            t("db01"),
            t("poweredOn"),
            n(8.0),
            n(16384.0),
            n(51200.0),
            t("Prod"),
            t("CentOS 7 (64-bit)"),
            t("CentOS 7"),
        ],
        vec![
            t("vdi01"),
            t("poweredOn"),
            n(4.0),
            n(8192.0),
            n(40960.0),
            t("VDI"),
            t("Microsoft Windows 10 (64-bit)"),
            E,
        ],
        vec![
            t("old01"),
            t("poweredOff"),
            n(2.0),
            n(2048.0),
            n(10240.0),
            t("VDI"),
            E,
            E,
        ],
    ];
    let vhost = vec![
        vhost_header(),
        vec![
            t("esx01"),
            t("Prod"),
            n(2.0),
            n(24.0),
            t("35%"),
            n(262144.0),
            n(35.0),
        ],
        vec![
            t("esx02"),
            t("Prod"),
            n(2.0),
            n(28.0),
            n(0.1),
            n(262144.0),
            n(0.0999),
        ],
        vec![
            t("esx03"),
            t("VDI"),
            n(2.0),
            n(32.0),
            t("abc"),
            n(524288.0),
            n(80.0),
        ],
    ];
    let metadata = vec![
        vec![t("RVTools major version"), t("Server")],
        vec![t("4.6.1"), t("vc01.example.local")],
    ];
    vec![("vInfo", vinfo), ("vHost", vhost), ("vMetaData", metadata)]
}

/// Two VMs and one host, no metadata sheet.
pub fn branch_office_inventory() -> Vec<(&'static str, Vec<Vec<CellValue>>)> {
    let vinfo = vec![
        vinfo_header(),
        vec![
            t("file01"),
            t("poweredOn"),
            n(2.0),
            n(4096.0),
            n(102400.0),
            t("Branch"),
            t("Debian GNU/Linux 12 (64-bit)"),
            E,
        ],
        vec![
            t("print01"),
            t("suspended"),
            n(1.0),
            n(1024.0),
            n(10240.0),
            t("Branch"),
            t("Microsoft Windows"),
            E,
        ],
    ];
    let vhost = vec![
        vhost_header(),
        vec![
            t("esx-br01"),
            t("Branch"),
            n(1.0),
            n(8.0),
            n(12.0),
            n(65536.0),
            t("45%"),
        ],
    ];
    vec![("vInfo", vinfo), ("vHost", vhost)]
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
