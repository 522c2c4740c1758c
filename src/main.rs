fn main() {
    if let Err(err) = bpmn_graph::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
