// Dashboard metrics over the finalized consolidated tables.
use crate::types::{DashboardMetrics, HostRow, VmRow};
use crate::util::{coerce_number, mean_present, sum_present};
use tracing::{info, warn};

const MIB_PER_GB: f64 = 1024.0;

/// Compute every dashboard metric from the VM and host tables.
///
/// Powered-on VMs are the basis for all VM-side sums and means. Missing or
/// unparseable cells are left out of both sums and means, so an absent
/// column simply yields zero for the metrics that depend on it.
pub fn compute_metrics(vinfo: &[VmRow], vhost: &[HostRow]) -> DashboardMetrics {
    let mut m = DashboardMetrics::default();
    if vinfo.is_empty() && vhost.is_empty() {
        warn!("No data available for dashboard metrics");
        return m;
    }

    let powered_on: Vec<&VmRow> = vinfo.iter().filter(|vm| vm.is_powered_on()).collect();
    m.total_powered_on_vms = powered_on.len();
    m.total_vms_all = vinfo.len();

    let vcpus = || powered_on.iter().map(|vm| coerce_number(&vm.cpus));
    let memory_gb = || {
        powered_on
            .iter()
            .map(|vm| coerce_number(&vm.memory).map(|v| v / MIB_PER_GB))
    };
    let provisioned_gb = || {
        powered_on
            .iter()
            .map(|vm| coerce_number(&vm.provisioned_mib).map(|v| v / MIB_PER_GB))
    };

    m.total_vcpus = sum_present(vcpus()) as i64;
    m.avg_vcpus_per_vm = mean_present(vcpus());
    m.total_ram_gb_vms = sum_present(memory_gb());
    m.avg_ram_gb_per_vm = mean_present(memory_gb());
    m.total_provisioned_gb = sum_present(provisioned_gb());
    m.avg_provisioned_gb_per_vm = mean_present(provisioned_gb());

    m.total_hosts = vhost.len();
    let cores = || vhost.iter().map(|h| coerce_number(&h.num_cores));
    let host_ram_gb = || {
        vhost
            .iter()
            .map(|h| coerce_number(&h.num_memory).map(|v| v / MIB_PER_GB))
    };

    m.total_physical_cores = sum_present(cores());
    m.avg_cores_per_host = mean_present(cores());
    m.avg_sockets_per_host = mean_present(vhost.iter().map(|h| coerce_number(&h.num_cpu)));
    m.total_host_ram_gb = sum_present(host_ram_gb());
    m.avg_ram_gb_per_host = mean_present(host_ram_gb());
    m.avg_cpu_utilization = mean_present(vhost.iter().map(|h| h.cpu_usage));
    m.avg_ram_utilization = mean_present(vhost.iter().map(|h| h.memory_usage));

    if m.total_physical_cores > 0.0 && m.total_vcpus > 0 {
        m.vcpu_to_pcore_ratio = m.total_vcpus as f64 / m.total_physical_cores;
    }

    info!(
        powered_on = m.total_powered_on_vms,
        hosts = m.total_hosts,
        ratio = m.vcpu_to_pcore_ratio,
        "Dashboard metrics generated"
    );
    m
}
