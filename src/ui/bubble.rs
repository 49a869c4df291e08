use crate::session::{Message, Role};
use crate::theme::Theme;
use eframe::egui::{self, Align, Layout, RichText, Ui};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleSide {
    Left,
    Center,
    Right,
}

/// How a transcript entry is drawn. Depends on the role only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleLayout {
    pub side: BubbleSide,
    pub label: &'static str,
    pub italic: bool,
    pub marker: Option<&'static str>,
}

impl BubbleLayout {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::User => Self {
                side: BubbleSide::Right,
                label: "You",
                italic: false,
                marker: None,
            },
            Role::Assistant => Self {
                side: BubbleSide::Left,
                label: "Assistant",
                italic: false,
                marker: None,
            },
            Role::System => Self {
                side: BubbleSide::Center,
                label: "Scenario",
                italic: true,
                marker: Some("⚙"),
            },
        }
    }

    fn layout(self) -> Layout {
        match self.side {
            BubbleSide::Left => Layout::top_down(Align::Min),
            BubbleSide::Center => Layout::top_down(Align::Center),
            BubbleSide::Right => Layout::top_down(Align::Max),
        }
    }
}

pub fn show_message(ui: &mut Ui, message: &Message, theme: &Theme) {
    let bubble = BubbleLayout::for_role(message.role);
    let text_color = theme.bubble_text(message.role);
    let max_width = (ui.available_width() * 0.78).max(160.0);

    ui.with_layout(bubble.layout(), |ui| {
        theme.bubble_frame(message.role).show(ui, |ui| {
            ui.set_max_width(max_width);

            let header = match bubble.marker {
                Some(marker) => format!("{marker} {} · {}", bubble.label, message.timestamp),
                None => format!("{} · {}", bubble.label, message.timestamp),
            };
            ui.label(RichText::new(header).small().color(theme.text_muted));

            let mut body = RichText::new(&message.text).color(text_color);
            if bubble.italic {
                body = body.italics();
            }
            ui.add(egui::Label::new(body).wrap());
        });
    });
}
