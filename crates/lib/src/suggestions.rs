//! Welcome view copy and suggestion chips.

pub const TITLE: &str = "TránsitoBot Soacha";
pub const SUBTITLE: &str = "Asistente de Normas de Tránsito";
pub const WELCOME_HEADING: &str = "¡Hola! Soy TránsitoBot Soacha 👋";
pub const WELCOME_BODY: &str = "Tu asistente virtual sobre normas de tránsito en Soacha, tu apoyo cerca de ti. \
Estoy aquí para ayudarte a resolver tus dudas de manera rápida y confiable.";
pub const SUGGESTIONS_HEADING: &str = "Preguntas frecuentes";
pub const INPUT_PLACEHOLDER: &str = "Escribe tu pregunta sobre normas de tránsito...";
pub const VOICE_PLACEHOLDER: &str = "Entrada por voz (próximamente)";
pub const TYPING_LABEL: &str = "Procesando con IA...";
pub const TYPING_STAGES: [&str; 3] = [
    "Vectorizando consulta",
    "Buscando en ChromaDB",
    "Generando respuesta",
];
pub const CITATION_HEADING: &str = "Fuente Legal:";

/// A clickable suggestion: `label` is shown, `question` is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionChip {
    pub id: &'static str,
    pub label: &'static str,
    pub question: &'static str,
}

impl SuggestionChip {
    /// Leading icon of the label (text before the first space).
    pub fn icon(&self) -> &'static str {
        let label = self.label.trim_start();
        label.split(' ').next().unwrap_or("")
    }

    /// Label without the leading icon.
    pub fn caption(&self) -> &'static str {
        let label = self.label.trim_start();
        label
            .split_once(' ')
            .map(|(_, rest)| rest.trim_start())
            .unwrap_or(label)
    }
}

pub static SUGGESTIONS: [SuggestionChip; 3] = [
    SuggestionChip {
        id: "1",
        label: "💰 Transitar por sitios restringidos o horas prohibidas por pico y placa",
        question: "¿Cuál es la multa por pico y placa?",
    },
    SuggestionChip {
        id: "2",
        label: "🚗 Estacionar un Vehículo en Sitios Prohibidos",
        question: "¿Que sucede si estaciono en sitio no permitido?",
    },
    SuggestionChip {
        id: "3",
        label: "⚡ Conducir a Velocidad Superior a la Máxima Permitida",
        question: "Límites de velocidad en la ciudad",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{respond, Topic};

    #[test]
    fn icon_and_caption_split() {
        let chip = &SUGGESTIONS[1];
        assert_eq!(chip.icon(), "🚗");
        assert_eq!(chip.caption(), "Estacionar un Vehículo en Sitios Prohibidos");
    }

    #[test]
    fn suggestions_hit_their_offline_topics() {
        let topics: Vec<Topic> = SUGGESTIONS.iter().map(|s| respond(s.question).topic).collect();
        assert_eq!(
            topics,
            vec![Topic::PicoYPlaca, Topic::Parking, Topic::SpeedLimit]
        );
    }
}
