use log::error;
use lumina_tree::Viewer;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = Viewer::new().run() {
        error!("{err}");
        std::process::exit(1);
    }
}
