//! Offline keyword responder.
//!
//! An ordered table of keyword predicates over the lowercased input; the first match
//! wins and yields a pre-authored answer with its legal source. Anything unmatched
//! gets the topic menu.

use async_trait::async_trait;
use serde_json::json;

use crate::api::{ApiError, ReplyItem, Responder};
use crate::message::{Message, Source};

/// Legal reference for a canned answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedSource {
    pub article: &'static str,
    pub law: &'static str,
    pub description: &'static str,
}

impl CannedSource {
    fn to_source(self) -> Source {
        Source::new(self.article, self.law, self.description)
    }
}

/// Which topic a canned answer covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    PicoYPlaca,
    Parking,
    SpeedLimit,
    MobilePhone,
    YellowLight,
    BlueZone,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedReply {
    pub topic: Topic,
    pub text: &'static str,
    pub source: Option<CannedSource>,
}

impl CannedReply {
    pub fn to_message(&self) -> Message {
        let sources = self.source.map(|s| vec![s.to_source()]);
        Message::bot(self.text, sources, None)
    }

    /// Same answer shaped like a backend reply item (source under `custom.sources`).
    pub fn to_reply_item(&self) -> ReplyItem {
        let custom = self.source.map(|s| {
            let mut map = serde_json::Map::new();
            map.insert(
                "sources".to_string(),
                json!([{
                    "article": s.article,
                    "law": s.law,
                    "description": s.description,
                }]),
            );
            map
        });
        ReplyItem {
            text: Some(self.text.to_string()),
            custom,
            ..Default::default()
        }
    }
}

type Predicate = fn(&str) -> bool;

fn any_of(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| input.contains(n))
}

/// Evaluated in order; first match wins.
static RULES: &[(Predicate, &CannedReply)] = &[
    (
        |m: &str| (m.contains("pico") && m.contains("placa")) || m.contains("sitio restringido"),
        &PICO_Y_PLACA,
    ),
    (
        |m: &str| any_of(m, &["estacionar", "sitio prohibido", "sitio no permitido"]),
        &PARKING,
    ),
    (
        |m: &str| any_of(m, &["velocidad", "límite", "exceso de velocidad"]),
        &SPEED_LIMIT,
    ),
    (|m: &str| any_of(m, &["celular", "teléfono", "móvil"]), &MOBILE_PHONE),
    (|m: &str| any_of(m, &["amarillo", "semáforo"]), &YELLOW_LIGHT),
    (
        |m: &str| any_of(m, &["zona azul", "parqueo", "parqueadero"]),
        &BLUE_ZONE,
    ),
];

/// Pick the canned answer for `input` (matching is case-insensitive).
pub fn respond(input: &str) -> &'static CannedReply {
    let lowered = input.to_lowercase();
    RULES
        .iter()
        .find(|(matches, _)| matches(lowered.as_str()))
        .map(|(_, reply)| *reply)
        .unwrap_or(&MENU)
}

/// Offline responder backed by the keyword table.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResponder;

#[async_trait]
impl Responder for LocalResponder {
    async fn reply(&self, text: &str) -> Result<Vec<ReplyItem>, ApiError> {
        let canned = respond(text);
        log::debug!("offline reply: {:?}", canned.topic);
        Ok(vec![canned.to_reply_item()])
    }

    fn endpoint(&self) -> String {
        "modo sin conexión".to_string()
    }
}

const LEY_769: &str = "Ley 769 de 2002";

pub static PICO_Y_PLACA: CannedReply = CannedReply {
    topic: Topic::PicoYPlaca,
    text: "La multa por incumplir la restricción de pico y placa es de 15 salarios mínimos legales diarios vigentes (SMLDV).
Aplica también en lo siguiente: invadir el carril exclusivo del SITP, circular en vehículos o motocicletas por zonas no permitidas, como andenes o ciclorrutas;
es decir, multiplicar el valor de un día de trabajo de salario mínimo X 15.

Además de la multa, el vehículo puede ser inmovilizado hasta por 24 horas.",
    source: Some(CannedSource {
        article: "Artículo 131 - Código Nacional de Tránsito Infracción C14",
        law: LEY_769,
        description: "Restricciones a la circulación de vehículos automotores",
    }),
};

pub static PARKING: CannedReply = CannedReply {
    topic: Topic::Parking,
    text: "¿Qué significa? Dejar el vehículo estacionado en lugares no autorizados, como andenes, zonas verdes, frente a garajes, en curvas o a menos de 5 metros de una esquina:

📄 **¿Cuál es la sanción? Multa de 15 SMLDV, es decir, multiplicar el valor de un día de trabajo de salario mínimo X 15.**
📋 **Si el conductor no está presente, el vehículo puede ser retirado con grúa.**

🛡️ (Contexto en Soacha: es una de las principales causas del \"círculo vicioso de congestión\", donde los conductores, por el trancón, estacionan mal y a su vez empeoran el trancón para todos los demás.)",
    source: Some(CannedSource {
        article: "Artículo 131 Infracción C02 - Código Nacional de Tránsito",
        law: LEY_769,
        description: "Estacionar un Vehículo en Sitios Prohibidos",
    }),
};

pub static SPEED_LIMIT: CannedReply = CannedReply {
    topic: Topic::SpeedLimit,
    text: "Los límites de velocidad en Colombia son:

🏙️ **Zona urbana:** 50 km/h máximo
🏘️ **Zona residencial:** 30 km/h máximo
🏫 **Zona escolar:** 30 km/h máximo
🛣️ **Carreteras nacionales:** 80 km/h máximo
🚗 **Autopistas doble calzada sin pasos peatonales:** 120 km/h máximo

Exceder estos límites puede resultar en multas de 8 a 30 SMLDV y suspensión de la licencia.
Contexto en Soacha: a pesar de la congestión, hay tramos (especialmente en la Autopista Sur en horas de bajo tráfico) donde se cometen excesos que aumentan el riesgo de accidentes graves.",
    source: Some(CannedSource {
        article: "Artículo 106 Infracción C29 - Código Nacional de Tránsito",
        law: LEY_769,
        description: "Conducir a Velocidad Superior a la Máxima Permitida",
    }),
};

pub static MOBILE_PHONE: CannedReply = CannedReply {
    topic: Topic::MobilePhone,
    text: "❌ **NO puedes usar el celular mientras conduces.**

Está prohibido:
• Hablar por teléfono sin manos libres
• Enviar mensajes de texto
• Usar aplicaciones
• Sostener el dispositivo

✅ **Excepciones permitidas:**
• Uso con sistema manos libres
• GPS montado en soporte fijo
• Llamadas de emergencia

La multa por usar el celular mientras conduces es de 15 SMLDV (aproximadamente $522,500).",
    source: Some(CannedSource {
        article: "Artículo 131 numeral 24 - Código Nacional de Tránsito",
        law: "Ley 769 de 2002, modificado por Ley 1383 de 2010",
        description: "Prohibición del uso de dispositivos móviles durante la conducción",
    }),
};

pub static YELLOW_LIGHT: CannedReply = CannedReply {
    topic: Topic::YellowLight,
    text: "🟡 **Cuando el semáforo está en amarillo debes:**

✅ **Si puedes detenerte de forma segura:** DETENTE antes de la línea de pare.

⚠️ **Si ya estás muy cerca:** Continúa con precaución, pero NO aceleres.

❌ **Está prohibido:**
• Acelerar para \"alcanzar\" a pasar
• Frenar bruscamente si puedes continuar seguro

El amarillo es una señal de **precaución y preparación para detenerse**, no una invitación a acelerar.

Violar esta norma puede resultar en multa de 8 SMLDV.",
    source: Some(CannedSource {
        article: "Artículo 119 - Código Nacional de Tránsito",
        law: LEY_769,
        description: "Cumplimiento de las señales de tránsito",
    }),
};

pub static BLUE_ZONE: CannedReply = CannedReply {
    topic: Topic::BlueZone,
    text: "🅿️ **La zona azul es un sistema de parqueo regulado:**

⏰ **Tiempo límite:** Máximo 2 horas continuas
💰 **Costo:** Varía según la ciudad (aprox. $1,500-$3,000 por hora)
📱 **Pago:** A través de aplicaciones móviles o parquímetros

🚫 **Prohibiciones:**
• Parquear sin pagar
• Exceder el tiempo máximo
• Regresar inmediatamente después de las 2 horas

La multa por no pagar zona azul es de 8 SMLDV (aproximadamente $278,600).",
    source: Some(CannedSource {
        article: "Artículo 138 - Código Nacional de Tránsito",
        law: LEY_769,
        description: "Estacionamiento en zonas reguladas",
    }),
};

pub static MENU: CannedReply = CannedReply {
    topic: Topic::Menu,
    text: "Gracias por tu pregunta. Actualmente puedo ayudarte con información sobre:

• Transitar por Sitios Restringidos o en Horas Prohibidas: multa por pico y placa
• Estacionar un Vehículo en Sitios Prohibidos o no permitidos
• Límites de velocidad, exceso de velocidad

¿Sobre cuál de estos temas te gustaría saber más?",
    source: None,
};
