/// Display version information
pub fn execute() {
    println!("allocator {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for the treasury allocation engine");
    println!(
        "Snapshot format v{}",
        allocator::serialization::SNAPSHOT_FORMAT_VERSION
    );
}
