fn main() {
    if let Err(err) = path_sankey::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
