fn main() {
    if let Err(err) = mylangc_drv::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
