use eframe::egui;
use pg_behaviors::HeaderDirection;
use pg_behaviors::PageSession;
use pg_core::PageError;
use pg_dom::Document;
use pg_dom::NodeId;
use std::time::Duration;

const NARROW_LAYOUT_WIDTH: f32 = 768.0;
const MAX_FRAME_STEP: f32 = 0.1;

const SECTION_FILL: egui::Color32 = egui::Color32::from_rgb(28, 32, 40);
const CARD_FILL: egui::Color32 = egui::Color32::from_rgb(64, 96, 150);
const IMAGE_FILL: egui::Color32 = egui::Color32::from_rgb(70, 70, 78);
const PENDING_IMAGE_FILL: egui::Color32 = egui::Color32::from_rgb(42, 42, 48);
const HEADER_DOWN_FILL: egui::Color32 = egui::Color32::from_rgb(18, 20, 26);
const HEADER_UP_FILL: egui::Color32 = egui::Color32::from_rgb(40, 60, 96);
const ACCENT: egui::Color32 = egui::Color32::from_rgb(240, 180, 80);

pub(crate) struct PreviewApp {
    session: PageSession,
    last_error: Option<String>,
}

impl PreviewApp {
    pub(crate) fn new(session: PageSession) -> Self {
        Self {
            session,
            last_error: None,
        }
    }

    fn record(&mut self, result: Result<bool, PageError>) {
        if let Err(error) = result {
            tracing::warn!(%error, code = error.code(), "page event failed");
            self.last_error = Some(error.to_string());
        }
    }

    fn header_panel(&mut self, ctx: &egui::Context) {
        let page = self.session.page();
        let behaviors = self.session.behaviors();
        let fill = match behaviors.header_direction(page) {
            Some(HeaderDirection::Down) => HEADER_DOWN_FILL,
            Some(HeaderDirection::Up) => HEADER_UP_FILL,
            Some(HeaderDirection::Neutral) | None => ctx.style().visuals.panel_fill,
        };
        let active = behaviors.active_links(page);
        let nav = behaviors.mobile_nav();
        let nav_state = behaviors.nav_state(page);
        let narrow = ctx.screen_rect().width() < NARROW_LAYOUT_WIDTH;
        let show_links = !narrow || nav_state.as_ref().is_some_and(|state| state.open);
        let links = behaviors
            .scroll_spy()
            .map(|spy| spy.links().to_vec())
            .unwrap_or_default();

        let mut clicked = None;
        egui::TopBottomPanel::top("page-header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).fill(fill))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(page.document.title());
                    ui.separator();
                    if show_links {
                        for link in &links {
                            let label = page.document.text_content(*link);
                            let selected = active.contains(link);
                            let text = egui::RichText::new(label.trim());
                            let text = if selected { text.color(ACCENT) } else { text };
                            if ui.selectable_label(selected, text).clicked() {
                                clicked = Some(*link);
                            }
                        }
                    }
                    if let (Some(nav), Some(state)) = (nav, nav_state.as_ref()) {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button(state.glyph.as_str()).clicked() {
                                clicked = Some(nav.toggle_control());
                            }
                        });
                    }
                });
            });

        if let Some(node) = clicked {
            let result = self.session.click(node);
            self.record(result);
        }
    }

    fn status_panel(&mut self, ctx: &egui::Context) {
        let page = self.session.page();
        let stats = self.session.behaviors().stats();
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("y = {:.0}", page.viewport.scroll_y()));
                ui.separator();
                ui.label(page.history.current().as_str());
                ui.separator();
                ui.label(format!(
                    "images {} | reveals {} | header {} | spy {}",
                    stats.images_loaded,
                    stats.reveals,
                    stats.header_evaluations,
                    stats.spy_evaluations
                ));
                if let Some(error) = &self.last_error {
                    ui.separator();
                    ui.colored_label(ui.visuals().error_fg_color, error.as_str());
                }
            });
        });
    }

    fn page_view(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let rect = response.rect;

        let viewport = &self.session.page().viewport;
        if (viewport.width() - rect.width()).abs() > 0.5
            || (viewport.height() - rect.height()).abs() > 0.5
        {
            let result = self.session.resize(rect.width(), rect.height());
            self.record(result);
        }

        if response.hovered() {
            let delta = ui.input(|input| input.smooth_scroll_delta.y);
            if delta != 0.0 {
                let result = self.session.scroll_by(-delta);
                self.record(result);
            }
        }

        let revealed_class = self.session.behaviors().config().classes.revealed.clone();
        paint_document(&painter, rect, &self.session, &revealed_class);

        if response.clicked() {
            let target = response.interact_pointer_pos().and_then(|pointer| {
                let document_y = pointer.y - rect.top() + self.session.page().viewport.scroll_y();
                hit_test(&self.session.page().document, document_y)
            });
            if let Some(target) = target {
                let result = self.session.click(target);
                self.record(result);
            }
        }
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|input| input.stable_dt).clamp(0.0, MAX_FRAME_STEP);
        match self.session.run_frame(Duration::from_secs_f32(dt)) {
            Ok(report) if report.images_loaded > 0 || report.reveals > 0 => {
                tracing::info!(
                    images = report.images_loaded,
                    reveals = report.reveals,
                    "page updated"
                );
            }
            Ok(_) => {}
            Err(error) => self.last_error = Some(error.to_string()),
        }

        self.header_panel(ctx);
        self.status_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.page_view(ui));

        if self.session.page().viewport.is_animating() || self.session.frames().pending_count() > 0 {
            ctx.request_repaint();
        }
    }
}

fn in_header(document: &Document, node: NodeId) -> bool {
    std::iter::once(node)
        .chain(document.ancestors(node))
        .any(|current| document.tag_name(current) == Some("header"))
}

/// Deepest rendered element under `document_y`, outside the header.
fn hit_test(document: &Document, document_y: f32) -> Option<NodeId> {
    document
        .elements()
        .into_iter()
        .filter(|node| {
            let layout = document.layout_box(*node);
            layout.height > 0.0 && document_y >= layout.top && document_y < layout.bottom()
        })
        .filter(|node| !in_header(document, *node))
        .last()
}

fn paint_document(painter: &egui::Painter, rect: egui::Rect, session: &PageSession, revealed_class: &str) {
    let page = session.page();
    let document = &page.document;
    let scroll_y = page.viewport.scroll_y();
    let text_color = painter.ctx().style().visuals.text_color();

    for node in document.elements() {
        let layout = document.layout_box(node);
        if layout.height <= 0.0 || in_header(document, node) {
            continue;
        }
        let top = rect.top() + layout.top - scroll_y;
        if top > rect.bottom() || top + layout.height < rect.top() {
            continue;
        }
        let block = egui::Rect::from_min_size(
            egui::pos2(rect.left() + 16.0, top),
            egui::vec2(rect.width() - 32.0, layout.height),
        );

        match document.tag_name(node).unwrap_or_default() {
            "section" => {
                painter.rect_filled(block, 4.0, SECTION_FILL);
                if let Some(id) = document.element_id(node) {
                    painter.text(
                        block.right_top() + egui::vec2(-8.0, 8.0),
                        egui::Align2::RIGHT_TOP,
                        format!("#{id}"),
                        egui::FontId::monospace(12.0),
                        ACCENT,
                    );
                }
            }
            "img" => {
                let (fill, label) = match document.attribute(node, "src") {
                    Some(src) => (IMAGE_FILL, src.to_owned()),
                    None => (
                        PENDING_IMAGE_FILL,
                        format!("deferred: {}", document.dataset(node, "src").unwrap_or("(none)")),
                    ),
                };
                painter.rect_filled(block.shrink(8.0), 4.0, fill);
                painter.text(
                    block.center(),
                    egui::Align2::CENTER_CENTER,
                    label,
                    egui::FontId::proportional(13.0),
                    text_color,
                );
            }
            "h1" | "h2" | "h3" | "p" | "a" => {
                let size = match document.tag_name(node) {
                    Some("h1") => 26.0,
                    Some("h2") => 20.0,
                    Some("h3") => 16.0,
                    _ => 14.0,
                };
                let color = if document.tag_name(node) == Some("a") { ACCENT } else { text_color };
                painter.text(
                    block.left_top() + egui::vec2(12.0, 0.0),
                    egui::Align2::LEFT_TOP,
                    document.text_content(node).trim(),
                    egui::FontId::proportional(size),
                    color,
                );
            }
            _ if document.has_class(node, "container") => {
                let alpha = if document.has_class(node, revealed_class) { 255 } else { 40 };
                let [r, g, b, _] = CARD_FILL.to_array();
                painter.rect_filled(
                    block.shrink(12.0),
                    8.0,
                    egui::Color32::from_rgba_unmultiplied(r, g, b, alpha),
                );
            }
            _ => {}
        }
    }
}
