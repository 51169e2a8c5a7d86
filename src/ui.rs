use crate::prelude::*;
use eframe::egui::{self, Align2, Color32, FontId, Frame, Key, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui};
use crate::graphics::{self, DrawInterface};
#[cfg(feature = "using_filesystem")]
use crate::{resource_interface, error::Result};

/// `DrawInterface` over an egui painter, screen coordinates are relative to the canvas corner
pub struct EguiDraw<'a> {
	pub painter: &'a Painter,
	pub origin: Pos2
}

impl<'a> EguiDraw<'a> {
	fn to_pos2(&self, p: V2) -> Pos2 {
		self.origin + v2_to_emath_pos2(p).to_vec2()
	}
}

impl<'a> DrawInterface for EguiDraw<'a> {
	fn draw_polyline(&self, points: Vec<V2>, stroke: [u8; 3], width: f32) {
		let px_points: Vec<Pos2> = points.iter().map(|p| self.to_pos2(*p)).collect();
		self.painter.add(Shape::line(px_points, Stroke::new(width, u8_3_to_color32(stroke))));
	}
	fn draw_rect(&self, min: V2, max: V2, fill: [u8; 4], border: [u8; 3]) {
		let (a, b) = (self.to_pos2(min), self.to_pos2(max));
		self.painter.rect_filled(Rect::from_two_pos(a, b), 2.0, Color32::from_rgba_unmultiplied(fill[0], fill[1], fill[2], fill[3]));
		self.painter.add(Shape::closed_line(
			vec![a, Pos2::new(b.x, a.y), b, Pos2::new(a.x, b.y)],
			Stroke::new(1.0, u8_3_to_color32(border))
		));
	}
	fn draw_circle_filled(&self, center: V2, radius: f32, color: [u8; 3]) {
		self.painter.circle_filled(self.to_pos2(center), radius, u8_3_to_color32(color));
	}
	fn text(&self, text: &str, pos: V2, color: [u8; 3], size: f32) {
		self.painter.text(self.to_pos2(pos), Align2::LEFT_TOP, text, FontId::proportional(size.max(6.0)), u8_3_to_color32(color));
	}
}

pub struct App {
	session: Session,
	controller: InteractionController,
	styles: Styles,
	rom_text: String,
	label_text: String,
	/// Relative circuit path for save/load, see `resource_interface::get_circuit_file_path`
	file_name: String,
	/// Last alert shown to the user
	status: Option<String>
}

impl App {
	pub fn new() -> Self {
		#[cfg(feature = "using_filesystem")]
		let (config, styles) = (
			SimConfig::load().unwrap_or_else(|e| {
				log::warn!("Using default config: {}", e);
				SimConfig::default()
			}),
			Styles::load().unwrap_or_else(|e| {
				log::warn!("Using default styles: {}", e);
				Styles::default()
			})
		);
		#[cfg(not(feature = "using_filesystem"))]
		let (config, styles) = (SimConfig::default(), Styles::default());
		Self {
			session: Session::new(config),
			controller: InteractionController::new(),
			styles,
			rom_text: String::new(),
			label_text: String::new(),
			file_name: "untitled".to_owned(),
			status: None
		}
	}
	fn report<T>(&mut self, result: crate::error::Result<T>) -> Option<T> {
		match result {
			Ok(t) => Some(t),
			Err(e) => {
				log::error!("{}", e);
				self.status = Some(e.to_string());
				None
			}
		}
	}
	#[cfg(feature = "using_filesystem")]
	fn save_to_file(&self) -> Result<()> {
		resource_interface::write_circuit_file(&resource_interface::get_circuit_file_path(&self.file_name), &self.session.save())
	}
	#[cfg(feature = "using_filesystem")]
	fn load_from_file(&mut self) -> Result<()> {
		let save = resource_interface::read_circuit_file(&resource_interface::get_circuit_file_path(&self.file_name))?;
		self.session.load(&save);
		Ok(())
	}
	#[cfg(feature = "using_filesystem")]
	fn xml_path(&self) -> String {
		resource_interface::CIRCUITS_DIR.to_owned() + &self.file_name + ".xml"
	}
	#[cfg(feature = "using_filesystem")]
	fn export_xml_file(&self) -> Result<()> {
		std::fs::write(self.xml_path(), self.session.export_cedar_xml()?)?;
		Ok(())
	}
	#[cfg(feature = "using_filesystem")]
	fn import_xml_file(&mut self) -> Result<ImportReport> {
		let raw = load_file_with_better_error(&self.xml_path())?;
		self.session.import_cedar_xml(&raw)
	}
	fn toolbar(&mut self, ui: &mut Ui) {
		ui.horizontal(|ui| {
			ui.label(APP_NAME);
			ui.separator();
			if ui.add_enabled(self.session.can_undo(), egui::Button::new("Undo")).clicked() {
				self.session.undo();
			}
			if ui.add_enabled(self.session.can_redo(), egui::Button::new("Redo")).clicked() {
				self.session.redo();
			}
			if ui.button("Clear").clicked() {
				self.controller.cancel();
				self.controller.selected = None;
				self.session.clear();
			}
			ui.separator();
			ui.checkbox(&mut self.session.clock_running, "Clock");
			if ui.button("Step clock").clicked() {
				self.session.tick_clock();
			}
			let mut flow = self.session.flow.is_enabled();
			if ui.checkbox(&mut flow, "Signal flow").changed() {
				self.session.flow.set_enabled(flow);
			}
			ui.separator();
			ui.label("File:");
			ui.text_edit_singleline(&mut self.file_name);
			#[cfg(feature = "using_filesystem")]
			{
				if ui.button("Save").clicked() {
					let result = self.save_to_file();
					self.report(result);
				}
				if ui.button("Load").clicked() {
					let result = self.load_from_file();
					self.report(result);
				}
				if ui.button("Export XML").clicked() {
					let result = self.export_xml_file();
					self.report(result);
				}
				if ui.button("Import XML").clicked() {
					let result = self.import_xml_file();
					if let Some(report) = self.report(result) {
						if !report.warnings.is_empty() {
							self.status = Some(report.warnings.join("\n"));
						}
					}
				}
			}
			let report = self.session.last_report();
			if !report.converged {
				ui.colored_label(Color32::YELLOW, format!("Did not settle after {} rounds", report.rounds));
			}
		});
		if let Some(status) = &self.status {
			let mut dismiss = false;
			ui.horizontal(|ui| {
				ui.colored_label(Color32::RED, status);
				dismiss = ui.button("OK").clicked();
			});
			if dismiss {
				self.status = None;
			}
		}
	}
	fn palette(&mut self, ui: &mut Ui) {
		for category in [GateCategory::InputOutput, GateCategory::Combinational, GateCategory::Sequential, GateCategory::Memory, GateCategory::Display] {
			ui.label(format!("{:?}", category));
			for kind in GateKind::ALL.iter().filter(|kind| kind.def().category == category) {
				let selected = self.controller.placing == Some(*kind);
				if ui.selectable_label(selected, kind.def().display_name).clicked() {
					self.controller.placing = if selected {None} else {Some(*kind)};
				}
			}
			ui.separator();
		}
		self.properties(ui);
	}
	/// Editors for the selected gate
	fn properties(&mut self, ui: &mut Ui) {
		let Some(id) = self.controller.selected else {
			return;
		};
		let Some(gate) = self.session.circuit().gate(id) else {
			return;
		};
		let kind = gate.kind;
		let wire_count = self.session.circuit().connections_touching(id).count();
		ui.label(format!("#{} {}, {} wires", id, kind.def().display_name, wire_count));
		for (index, name) in kind.def().input_names.iter().enumerate() {
			let driver = self.session.circuit().driver_of(PortRef::new(id, index)).map(|conn| format!("#{}", conn.from.gate_id));
			ui.label(format!("{} <- {}", name, driver.unwrap_or_else(|| "open".to_owned())));
		}
		match kind {
			GateKind::Input => {
				if ui.button("Toggle").clicked() {
					let result = self.session.toggle_input(id);
					self.report(result);
				}
			},
			GateKind::Rom8x4 => {
				ui.text_edit_singleline(&mut self.rom_text);
				if ui.button("Write ROM").clicked() {
					let result = self.session.set_rom_contents(id, &self.rom_text);
					self.report(result);
				}
			},
			GateKind::Label => {
				ui.text_edit_singleline(&mut self.label_text);
				if ui.button("Set text").clicked() {
					let result = self.session.set_label_text(id, &self.label_text);
					self.report(result);
				}
			},
			_ => {}
		}
		if ui.button("Delete").clicked() {
			self.controller.delete_selected(&mut self.session);
		}
	}
	fn canvas(&mut self, ui: &mut Ui) {
		let (response, painter) = ui.allocate_painter(ui.available_size_before_wrap(), Sense::click_and_drag());
		let origin = response.rect.min;
		let to_screen = |pos: Pos2| emath_vec2_to_v2(pos - origin);
		let (hover, primary_pressed, secondary_pressed, middle_pressed, released, scroll) = ui.input(|i| (
			i.pointer.hover_pos(),
			i.pointer.primary_pressed(),
			i.pointer.secondary_pressed(),
			i.pointer.button_pressed(egui::PointerButton::Middle),
			i.pointer.any_released(),
			i.smooth_scroll_delta.y
		));
		if let Some(pos) = hover {
			let screen = to_screen(pos);
			if response.hovered() {
				if primary_pressed {
					self.controller.pointer_down(&mut self.session, screen, PointerButton::Primary);
				}
				if secondary_pressed {
					self.controller.pointer_down(&mut self.session, screen, PointerButton::Secondary);
				}
				if middle_pressed {
					self.controller.pointer_down(&mut self.session, screen, PointerButton::Middle);
				}
				if scroll != 0.0 {
					self.controller.scroll(&mut self.session, screen, scroll / 50.0);
				}
			}
			self.controller.pointer_move(&mut self.session, screen);
			if released {
				self.controller.pointer_up(&mut self.session, screen);
			}
		}
		if ui.input(|i| i.key_pressed(Key::Delete)) {
			self.controller.delete_selected(&mut self.session);
		}
		if ui.input(|i| i.key_pressed(Key::Escape)) {
			self.controller.cancel();
		}
		painter.rect_filled(response.rect, 0.0, u8_3_to_color32(self.styles.color_background));
		if self.styles.show_grid {
			self.draw_grid(&painter, response.rect);
		}
		let draw = EguiDraw {painter: &painter, origin};
		let pending_wire = self.controller.pending_wire(&self.session);
		graphics::draw_session(&self.session, &draw, &self.styles, self.controller.selected, pending_wire);
	}
	fn draw_grid(&self, painter: &Painter, rect: Rect) {
		let view = &self.session.viewport;
		let spacing = self.session.config.grid_size * view.zoom;
		if spacing < 4.0 {
			return;
		}
		let color = u8_3_to_color32(self.styles.color_grid);
		let start = V2::new(view.offset.x.rem_euclid(spacing), view.offset.y.rem_euclid(spacing));
		let mut x = start.x;
		while x < rect.width() {
			painter.line_segment([rect.min + egui::vec2(x, 0.0), rect.min + egui::vec2(x, rect.height())], Stroke::new(1.0, color));
			x += spacing;
		}
		let mut y = start.y;
		while y < rect.height() {
			painter.line_segment([rect.min + egui::vec2(0.0, y), rect.min + egui::vec2(rect.width(), y)], Stroke::new(1.0, color));
			y += spacing;
		}
	}
	fn scope_panel(&mut self, ui: &mut Ui) {
		ui.horizontal(|ui| {
			ui.label("Oscilloscope");
			let paused = self.session.scope.is_paused();
			if ui.button(if paused {"Resume"} else {"Pause"}).clicked() {
				if paused {
					self.session.scope.resume();
				}
				else {
					self.session.scope.pause();
				}
			}
			if ui.button("Clear").clicked() {
				self.session.scope.clear();
			}
		});
		let probes = self.session.scope.probes();
		let height = self.styles.scope_trace_height_px;
		let (response, painter) = ui.allocate_painter(egui::vec2(ui.available_width(), height * (probes.len().max(1) as f32) * 1.5), Sense::hover());
		let draw = EguiDraw {painter: &painter, origin: response.rect.min};
		for (row, probe) in probes.iter().enumerate() {
			let base = (row as f32 + 1.0) * height * 1.5;
			draw.text(&format!("#{}", probe), V2::new(0.0, base - height), self.styles.text_color, 10.0);
			let points: Vec<V2> = self.session.scope.trace(*probe).iter().enumerate().filter_map(|(i, value)| {
				value.map(|v| V2::new(40.0 + i as f32 * self.styles.scope_sample_px, base - if v {height} else {0.0}))
			}).collect();
			if points.len() > 1 {
				draw.draw_polyline(points, self.styles.color_wire_high, 1.5);
			}
		}
	}
}

impl eframe::App for App {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		let dt = ctx.input(|i| i.unstable_dt).min(UI_MAX_FRAME_SIMULATION_TIME);
		self.session.advance(dt);
		egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
		egui::SidePanel::left("palette").show(ctx, |ui| {
			egui::ScrollArea::vertical().show(ui, |ui| self.palette(ui));
		});
		egui::TopBottomPanel::bottom("scope").resizable(true).show(ctx, |ui| self.scope_panel(ui));
		egui::CentralPanel::default().show(ctx, |ui: &mut Ui| {
			Frame::canvas(ui.style()).show(ui, |ui| self.canvas(ui));
		});
		ctx.request_repaint();
	}
}
