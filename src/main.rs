fn main() {
    if let Err(err) = sociogram::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
