use vista_bindings::{BindingId, FieldRef, MaterialField};
use vista_runtime::SceneRuntime;
use vista_tools::SceneInspector;

struct Row {
    id: BindingId,
    field: FieldRef,
    min: f64,
    max: f64,
    step: f64,
    value: f64,
}

fn label(field: &FieldRef) -> String {
    match field {
        FieldRef::Position { axis, .. } => format!("position {axis:?}").to_lowercase(),
        FieldRef::Rotation { axis, .. } => format!("rotation {axis:?}").to_lowercase(),
        FieldRef::Scale { axis, .. } => format!("scale {axis:?}").to_lowercase(),
        FieldRef::Visible { .. } => "visible".into(),
        FieldRef::Material { field, .. } => format!("{field:?}").to_lowercase(),
        FieldRef::Geometry { param, .. } => format!("{param:?}").to_lowercase(),
        FieldRef::CameraFov => "fov".into(),
    }
}

fn input(runtime: &mut SceneRuntime, id: BindingId, value: f64, commit: bool) {
    let bindings = runtime.bindings_mut();
    if let Err(err) = bindings.on_user_input(id, value) {
        tracing::warn!(%err, "panel input rejected");
        return;
    }
    if commit {
        if let Err(err) = bindings.on_commit_input(id) {
            tracing::warn!(%err, "panel commit rejected");
        }
    }
}

fn control(ui: &mut egui::Ui, runtime: &mut SceneRuntime, row: &Row) {
    let text = label(&row.field);
    if row.field.is_toggle() {
        let mut on = row.value >= 0.5;
        if ui.checkbox(&mut on, text).changed() {
            input(runtime, row.id, if on { 1.0 } else { 0.0 }, true);
        }
        return;
    }
    if let FieldRef::Material {
        field: MaterialField::Color,
        ..
    } = row.field
    {
        let c = row.value as u32;
        let mut rgb = [(c >> 16) as u8, (c >> 8) as u8, c as u8];
        ui.horizontal(|ui| {
            if egui::color_picker::color_edit_button_srgb(ui, &mut rgb).changed() {
                let packed = (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2]);
                input(runtime, row.id, f64::from(packed), true);
            }
            ui.label(text);
        });
        return;
    }

    let mut value = row.value;
    let response = ui.add(
        egui::Slider::new(&mut value, row.min..=row.max)
            .step_by(row.step)
            .text(text),
    );
    if response.changed() {
        input(runtime, row.id, value, !response.dragged());
    }
    if response.drag_stopped() {
        if let Err(err) = runtime.bindings_mut().on_commit_input(row.id) {
            tracing::warn!(%err, "panel commit rejected");
        }
    }
}

/// Tuning panel: one collapsible section per binding section plus a
/// read-only scene summary.
pub fn draw(ctx: &egui::Context, runtime: &mut SceneRuntime) {
    if !runtime.panel_visible() {
        return;
    }

    egui::SidePanel::right("controls")
        .default_width(300.0)
        .show(ctx, |ui| {
            let summary = SceneInspector::summary(runtime);
            ui.heading("vista");
            ui.label(format!(
                "{}  {}x{} @{:.1}x",
                summary.preset.as_deref().unwrap_or("empty"),
                summary.viewport[0],
                summary.viewport[1],
                summary.pixel_ratio
            ));
            ui.label(format!(
                "Tick {}  avg {:.2} ms  max {:.2} ms",
                summary.ticks, summary.avg_tick_ms, summary.max_tick_ms
            ));
            ui.label(format!(
                "Drawables {}  triangles {}",
                summary.drawables, summary.triangles
            ));
            if ui.button("spin").clicked() && !runtime.spin_focus() {
                tracing::debug!("nothing to spin");
            }
            ui.separator();

            let sections: Vec<String> = runtime
                .bindings()
                .sections()
                .into_iter()
                .map(String::from)
                .collect();
            for section in sections {
                let rows: Vec<Row> = runtime
                    .bindings()
                    .section(&section)
                    .map(|(id, b)| Row {
                        id,
                        field: b.field(),
                        min: b.min(),
                        max: b.max(),
                        step: b.step(),
                        value: b.value(),
                    })
                    .collect();
                egui::CollapsingHeader::new(section.as_str())
                    .default_open(true)
                    .show(ui, |ui| {
                        for row in &rows {
                            control(ui, runtime, row);
                            if let Some(reason) = runtime.bindings().last_failure(row.id) {
                                ui.colored_label(egui::Color32::LIGHT_RED, reason);
                            }
                        }
                    });
            }

            ui.separator();
            egui::CollapsingHeader::new("Scene").show(ui, |ui| {
                for node in SceneInspector::list_nodes(runtime.scene()) {
                    ui.monospace(node.to_string());
                }
            });

            ui.separator();
            ui.small("h: hide panel | s: show panel | double-click: fullscreen");
        });
}
