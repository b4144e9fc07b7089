fn main() {
    if let Err(e) = abstractable::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
