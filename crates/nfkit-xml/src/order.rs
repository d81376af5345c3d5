/// Hub order JSON built from an NF-e.
///
/// Values are looked up with descendant paths such as `["enderDest", "CEP"]`:
/// the first `CEP` element in document order that sits anywhere below an
/// `enderDest`. Missing elements become `null`. Fields the hub requires but
/// an NF-e does not carry get fixed placeholders, partly configurable
/// through [`HubDefaults`].
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::XmlError;

/// Appended to the issue timestamp, once its UTC offset is dropped.
pub const ORDER_TIME_SUFFIX: &str = ".323Z";

/// Characters kept after the colon of an `infAdProd` reference.
const CHANNEL_ID_LEN: usize = 16;

/// Decimal places of `vUnCom` dropped from the unit price.
const UNIT_PRICE_DROP: usize = 6;

/// Per-hub values written into every order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubDefaults {
    /// `idCanal`.
    pub channel_id: u32,
    /// `idLoja`.
    pub store_id: String,
    /// `idHub`.
    pub hub_id: u32,
    /// Domain of the placeholder customer e-mail.
    pub email_domain: String,
}

impl Default for HubDefaults {
    fn default() -> Self {
        Self {
            channel_id: 2,
            store_id: "1".to_owned(),
            hub_id: 2,
            email_domain: "mercadolibre.com".to_owned(),
        }
    }
}

/// An order in the shape the hub accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Marketplace order id from the first `infAdProd`.
    #[serde(rename = "idPedidoHub")]
    pub hub_order_id: Option<String>,
    /// Same value as `hub_order_id`.
    #[serde(rename = "idPedidoCanal")]
    pub channel_order_id: Option<String>,
    /// `dhEmi` without its offset, with [`ORDER_TIME_SUFFIX`].
    #[serde(rename = "dataPedido")]
    pub ordered_at: Option<String>,
    /// Date part of `dhEmi`.
    #[serde(rename = "dataEntrega")]
    pub delivery_date: Option<String>,
    #[serde(rename = "idCanal")]
    pub channel_id: u32,
    #[serde(rename = "idLoja")]
    pub store_id: String,
    #[serde(rename = "idHub")]
    pub hub_id: u32,
    #[serde(rename = "observacoesEntrega")]
    pub delivery_notes: Option<String>,
    pub status: u32,
    #[serde(rename = "entrega")]
    pub delivery: Delivery,
    #[serde(rename = "cliente")]
    pub customer: Customer,
    #[serde(rename = "pagamento")]
    pub payment: Payment,
    pub fulfillment: u32,
    #[serde(rename = "produtos")]
    pub products: Vec<OrderItem>,
}

/// Delivery address, from `enderDest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub cep: Option<String>,
    #[serde(rename = "numero")]
    pub number: Option<String>,
    #[serde(rename = "endereco")]
    pub street: Option<String>,
    #[serde(rename = "complemento")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    pub district: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    #[serde(rename = "estado")]
    pub state: Option<String>,
}

/// Customer, from `dest`. Contact fields are placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// `dest/CNPJ`, else `dest/CPF`.
    #[serde(rename = "cnpjCpf")]
    pub document: Option<String>,
    pub ie: String,
    pub rg: String,
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub ddd: String,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "celular")]
    pub mobile: String,
    pub email: String,
    #[serde(rename = "nomeFantasia")]
    pub trade_name: Option<String>,
}

/// Payment totals, from `total/ICMSTot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    #[serde(rename = "tipoPagamento")]
    pub kind: u32,
    #[serde(rename = "bandeira")]
    pub card_brand: u32,
    #[serde(rename = "valorDesconto")]
    pub discount: Option<String>,
    #[serde(rename = "valorFrete")]
    pub freight: Option<String>,
    #[serde(rename = "valorTotal")]
    pub total: Option<String>,
    #[serde(rename = "parcelas")]
    pub installments: u32,
}

/// One `det` item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    /// `prod/cProd`.
    pub sku: Option<String>,
    /// `prod/qCom`.
    #[serde(rename = "quantidade")]
    pub quantity: Option<String>,
    /// `prod/vUnCom` without its last six decimals.
    #[serde(rename = "precoUnitario")]
    pub unit_price: Option<String>,
    /// Marketplace order id from this item's `infAdProd`.
    #[serde(rename = "idPedidoCanal")]
    pub channel_order_id: Option<String>,
    #[serde(rename = "valorComissao")]
    pub commission: u32,
}

impl Order {
    /// Builds the order for one NF-e document.
    ///
    /// # Errors
    ///
    /// [`XmlError::Parse`] if the document is not well-formed or has no root
    /// element.
    pub fn from_xml(xml: &str, defaults: &HubDefaults) -> Result<Self, XmlError> {
        let doc = Element::parse(xml)?;
        let value = |path: &[&str]| doc.value(path);

        let issued = value(&["ide", "dhEmi"]).filter(|d| !d.is_empty());
        let reference = after_colon(value(&["det", "infAdProd"]));
        let email_user = reference.clone().unwrap_or_else(|| "cliente".to_owned());

        let products = doc
            .find_all("det")
            .into_iter()
            .map(|det| OrderItem {
                sku: det.value(&["prod", "cProd"]),
                quantity: det.value(&["prod", "qCom"]),
                unit_price: det
                    .value(&["prod", "vUnCom"])
                    .map(|p| drop_last(&p, UNIT_PRICE_DROP)),
                channel_order_id: after_colon(det.value(&["infAdProd"])),
                commission: 0,
            })
            .collect::<Vec<_>>();

        let name = value(&["dest", "xNome"]);
        let order = Self {
            hub_order_id: reference.clone(),
            channel_order_id: reference,
            ordered_at: issued
                .as_deref()
                .map(|d| format!("{}{ORDER_TIME_SUFFIX}", drop_last(d, 6))),
            delivery_date: issued.as_deref().map(|d| drop_last(d, 15)),
            channel_id: defaults.channel_id,
            store_id: defaults.store_id.clone(),
            hub_id: defaults.hub_id,
            delivery_notes: None,
            status: 0,
            delivery: Delivery {
                cep: value(&["enderDest", "CEP"]),
                number: value(&["enderDest", "nro"]),
                street: value(&["enderDest", "xLgr"]),
                complement: value(&["enderDest", "xCpl"]),
                district: value(&["enderDest", "xBairro"]),
                city: value(&["enderDest", "xMun"]),
                state: value(&["enderDest", "UF"]),
            },
            customer: Customer {
                document: value(&["dest", "CNPJ"])
                    .filter(|v| !v.is_empty())
                    .or_else(|| value(&["dest", "CPF"]).filter(|v| !v.is_empty())),
                ie: String::new(),
                rg: String::new(),
                name: name.clone(),
                ddd: "11".to_owned(),
                phone: None,
                mobile: "111111111".to_owned(),
                email: format!("{email_user}@{}", defaults.email_domain),
                trade_name: name,
            },
            payment: Payment {
                kind: 2,
                card_brand: 0,
                discount: value(&["total", "ICMSTot", "vDesc"]),
                freight: value(&["total", "ICMSTot", "vFrete"]),
                total: value(&["total", "ICMSTot", "vNF"]),
                installments: 1,
            },
            fulfillment: 1,
            products,
        };
        tracing::debug!(
            order = order.hub_order_id.as_deref().unwrap_or("-"),
            items = order.products.len(),
            "order extracted"
        );
        Ok(order)
    }
}

/// Up to 16 characters after the first `:`, trimmed. Text without a colon
/// is kept whole; empty text counts as missing.
fn after_colon(value: Option<String>) -> Option<String> {
    let value = value?;
    match value.split_once(':') {
        Some((_, rest)) => Some(
            rest.chars()
                .take(CHANNEL_ID_LEN)
                .collect::<String>()
                .trim()
                .to_owned(),
        ),
        None if value.is_empty() => None,
        None => Some(value),
    }
}

/// `text` without its last `n` characters; empty when it is not longer.
fn drop_last(text: &str, n: usize) -> String {
    let keep = text.chars().count().saturating_sub(n);
    text.chars().take(keep).collect()
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(e: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            ..Self::default()
        }
    }

    /// Parses `xml` into a nameless document node holding the root element.
    fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack = vec![Self::default()];

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Self::named(&e)),
                Event::Empty(e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Self::named(&e));
                    }
                }
                Event::End(_) => {
                    let closed = stack.pop();
                    match (closed, stack.last_mut()) {
                        (Some(element), Some(parent)) => parent.children.push(element),
                        (Some(_) | None, None) | (None, Some(_)) => return Err(unbalanced()),
                    }
                }
                Event::Text(t) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(doc), true) if !doc.children.is_empty() => Ok(doc),
            (Some(_), true) => Err(XmlError::Parse {
                detail: "document has no root element".to_owned(),
            }),
            (Some(_) | None, _) => Err(unbalanced()),
        }
    }

    /// Own text followed by the text of every descendant.
    fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Text of the first descendant matching `path`.
    fn value(&self, path: &[&str]) -> Option<String> {
        self.find(path).map(Self::text_content)
    }

    /// First descendant named like the last step of `path` whose ancestors,
    /// below `self`, include the other steps in order.
    fn find(&self, path: &[&str]) -> Option<&Self> {
        let (last, ancestors) = path.split_last()?;
        let mut above = Vec::new();
        self.children
            .iter()
            .find_map(|child| child.search(last, ancestors, &mut above))
    }

    fn search<'a>(
        &'a self,
        last: &str,
        ancestors: &[&str],
        above: &mut Vec<&'a str>,
    ) -> Option<&'a Self> {
        if self.name == last && is_subsequence(ancestors, above.as_slice()) {
            return Some(self);
        }
        above.push(self.name.as_str());
        let mut found = None;
        for child in &self.children {
            found = child.search(last, ancestors, above);
            if found.is_some() {
                break;
            }
        }
        above.pop();
        found
    }

    /// Every descendant named `name`, in document order.
    fn find_all(&self, name: &str) -> Vec<&Self> {
        let mut out = Vec::new();
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            out.extend(child.find_all(name));
        }
        out
    }
}

fn is_subsequence(needles: &[&str], haystack: &[&str]) -> bool {
    let mut needles = needles.iter().peekable();
    for item in haystack {
        if needles.peek().is_some_and(|n| *n == item) {
            needles.next();
        }
    }
    needles.peek().is_none()
}

fn unbalanced() -> XmlError {
    XmlError::Parse {
        detail: "unbalanced element tags".to_owned(),
    }
}
