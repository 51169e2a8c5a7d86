#[cfg(feature = "using_egui")]
use logic_bench::ui_main;

fn main() {
	env_logger::init();
	#[cfg(feature = "using_egui")]
	{
		if let Err(e) = ui_main() {
			log::error!("GUI exited with error: {}", e);
		}
	}
	#[cfg(not(feature = "using_egui"))]
	println!("Enable `using_egui` feature to use GUI");
}
