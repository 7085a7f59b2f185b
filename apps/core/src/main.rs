fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match quickhop_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("[quickhop-core] {error}");
            std::process::exit(2);
        }
    };

    if let Err(error) = quickhop_core::runtime::run_with_options(options) {
        eprintln!("[quickhop-core] runtime failed: {error}");
        std::process::exit(1);
    }
}
