use kube::core::CustomResourceExt;
use workload_controller::crd::ManagedWorkload;

fn main() {
    let crd = ManagedWorkload::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD to YAML");
    println!("{}", yaml);
}
