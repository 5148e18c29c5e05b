//! Beans shared by the tests of this crate.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::{Map, Value};
use vc_token::Token;

use crate::{Bean, BeanBox, BeanMeta, Error, NameTransformer, Subtypes, bean_codec};

// -----------------------------------------------------------------------------
// Plain beans

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    /// Never mapped; only advice writes it.
    pub password: Option<String>,
}

impl Bean for User {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("User")
            .with_default()
            .field("firstName", |u| &u.first_name, |u, v| u.first_name = v)
            .field("lastName", |u| &u.last_name, |u, v| u.last_name = v)
            .ignore("password")
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: i32,
}

impl Bean for Address {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Address")
            .with_default()
            .field("street", |a| &a.street, |a, v| a.street = v)
            .field("city", |a| &a.city, |a, v| a.city = v)
            .field("zip", |a| &a.zip, |a, v| a.zip = v)
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub address: Address,
}

impl Bean for Person {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Person")
            .with_default()
            .field("name", |p| &p.name, |p, v| p.name = v)
            .field("age", |p| &p.age, |p, v| p.age = v)
            .field("address", |p| &p.address, |p, v| p.address = v)
            .build()
    }
}

/// A self-referencing bean.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub next: Option<Box<Node>>,
}

impl Node {
    /// A chain of `len` nodes.
    pub fn chain(len: usize) -> Self {
        let mut node = Node {
            name: format!("n{}", len - 1),
            next: None,
        };
        for index in (0..len - 1).rev() {
            node = Node {
                name: format!("n{index}"),
                next: Some(Box::new(node)),
            };
        }
        node
    }
}

impl Bean for Node {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Node")
            .with_default()
            .field("name", |n| &n.name, |n, v| n.name = v)
            .field("next", |n| &n.next, |n, v| n.next = v)
            .build()
    }
}

bean_codec!(Address, Node);

// -----------------------------------------------------------------------------
// Creators and subtypes

/// Built by a creator from `x` and `y`; `label` is set afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub label: String,
}

impl Bean for Point {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Point")
            .creator_property("x", 0, |p| &p.x)
            .creator_property("y", 1, |p| &p.y)
            .field("label", |p| &p.label, |p, v| p.label = v)
            .creator(|args| {
                Ok(Point {
                    x: args.take(0)?,
                    y: args.take_or_default(1)?,
                    label: String::new(),
                })
            })
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dog {
    pub kind: String,
    pub name: String,
    pub good: bool,
}

impl Bean for Dog {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Dog")
            .with_default()
            .read_only("kind", |d| &d.kind)
            .field("name", |d| &d.name, |d, v| d.name = v)
            .field("good", |d| &d.good, |d, v| d.good = v)
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Cat {
    pub kind: String,
    pub name: String,
    pub lives: u8,
}

impl Bean for Cat {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Cat")
            .with_default()
            .read_only("kind", |c| &c.kind)
            .field("name", |c| &c.name, |c, v| c.name = v)
            .field("lives", |c| &c.lives, |c, v| c.lives = v)
            .build()
    }
}

/// Created as a [`Dog`] or a [`Cat`], depending on `kind`.
#[derive(Debug, Clone, PartialEq)]
pub enum Pet {
    Dog(Dog),
    Cat(Cat),
}

impl Pet {
    fn kind(&self) -> &String {
        match self {
            Pet::Dog(dog) => &dog.kind,
            Pet::Cat(cat) => &cat.kind,
        }
    }
}

impl Bean for Pet {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Pet")
            .creator_property("kind", 0, Pet::kind)
            .dynamic_creator(|args| {
                let kind: String = args.take(0)?;
                match kind.as_str() {
                    "dog" => Ok(Box::new(Dog {
                        kind,
                        ..Dog::default()
                    }) as BeanBox),
                    "cat" => Ok(Box::new(Cat {
                        kind,
                        lives: 9,
                        ..Cat::default()
                    }) as BeanBox),
                    "fish" => Ok(Box::new(Fish) as BeanBox),
                    other => Err(Error::custom(format!("no pet of kind {other:?}"))),
                }
            })
            .subtype::<Dog>(Pet::Dog)
            .subtype::<Cat>(Pet::Cat)
            .build()
    }
}

/// Produced by the `Pet` creator, but never declared as a subtype.
#[derive(Debug, Default)]
pub struct Fish;

// -----------------------------------------------------------------------------
// External type ids

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Count(u32),
    Place(Address),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Count(0)
    }
}

fn payload_subtypes() -> Subtypes<Payload> {
    Subtypes::new()
        .with("text", Payload::Text, |p| match p {
            Payload::Text(text) => Some(text),
            _ => None,
        })
        .with("count", Payload::Count, |p| match p {
            Payload::Count(count) => Some(count),
            _ => None,
        })
        .with("place", Payload::Place, |p| match p {
            Payload::Place(address) => Some(address),
            _ => None,
        })
}

/// `payload` is typed by the sibling field `type`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Envelope {
    pub id: u32,
    pub payload: Payload,
}

impl Bean for Envelope {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Envelope")
            .with_default()
            .field("id", |e| &e.id, |e, v| e.id = v)
            .external(
                "payload",
                "type",
                payload_subtypes(),
                |e| &e.payload,
                |e, v| e.payload = v,
            )
            .build()
    }
}

/// `format` is both a creator property and the type id of `body`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    pub format: String,
    pub body: Payload,
}

impl Bean for Document {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Document")
            .creator_property("format", 0, |d| &d.format)
            .external(
                "body",
                "format",
                payload_subtypes(),
                |d| &d.body,
                |d, v| d.body = v,
            )
            .creator(|args| {
                Ok(Document {
                    format: args.take(0)?,
                    body: Payload::default(),
                })
            })
            .build()
    }
}

// -----------------------------------------------------------------------------
// Views, unwrapping, catch-all

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub bio: String,
}

impl Bean for Profile {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Profile")
            .with_default()
            .field("name", |p| &p.name, |p, v| p.name = v)
            .field("email", |p| &p.email, |p, v| p.email = v)
            .views(&["private"])
            .field("bio", |p| &p.bio, |p, v| p.bio = v)
            .views(&["public", "private"])
            .build()
    }
}

/// Writes its home address inline, as `home_street`, `home_city`...
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub home: Address,
}

impl Bean for Customer {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Customer")
            .with_default()
            .field("name", |c| &c.name, |c, v| c.name = v)
            .unwrapped_with(
                "home",
                NameTransformer::prefixed("home_"),
                |c| &c.home,
                |c, v| c.home = v,
            )
            .build()
    }
}

/// Unwraps a [`Customer`], which unwraps an [`Address`] in turn.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Order {
    pub number: u32,
    pub customer: Customer,
    pub extra: Map<String, Value>,
}

impl Bean for Order {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Order")
            .with_default()
            .field("number", |o| &o.number, |o, v| o.number = v)
            .unwrapped_with(
                "customer",
                NameTransformer::prefixed("c_"),
                |o| &o.customer,
                |o, v| o.customer = v,
            )
            .any_setter(|o, name, value| {
                o.extra.insert(name, value);
            })
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Settings {
    pub name: String,
    pub extra: Map<String, Value>,
}

impl Bean for Settings {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Settings")
            .with_default()
            .field("name", |s| &s.name, |s, v| s.name = v)
            .any_getter(|s| &s.extra)
            .any_setter(|s, name, value| {
                s.extra.insert(name, value);
            })
            .build()
    }
}

// -----------------------------------------------------------------------------
// Identity

#[derive(Debug, Default, PartialEq)]
pub struct Employee {
    pub name: String,
    pub manager: Option<Arc<Employee>>,
}

impl Bean for Employee {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Employee")
            .with_default()
            .generated_id("@id")
            .field("name", |e| &e.name, |e, v| e.name = v)
            .field("manager", |e| &e.manager, |e, v| e.manager = v)
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Team {
    pub members: Vec<Arc<Employee>>,
}

impl Bean for Team {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Team")
            .with_default()
            .field("members", |t| &t.members, |t, v| t.members = v)
            .build()
    }
}

/// Identified by its `code`, and always written as that code.
#[derive(Debug, Default, PartialEq)]
pub struct Currency {
    pub code: String,
    pub digits: u8,
}

impl Bean for Currency {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Currency")
            .with_default()
            .field("code", |c| &c.code, |c, v| c.code = v)
            .field("digits", |c| &c.digits, |c, v| c.digits = v)
            .property_id("code")
            .always_as_id()
            .build()
    }
}

/// Identified by `code`, which is declared after `label`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tag {
    pub label: String,
    pub code: String,
}

impl Bean for Tag {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Tag")
            .with_default()
            .field("label", |t| &t.label, |t, v| t.label = v)
            .field("code", |t| &t.code, |t, v| t.code = v)
            .property_id("code")
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Price {
    pub amount: i64,
    pub currency: Option<Arc<Currency>>,
}

impl Bean for Price {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Price")
            .with_default()
            .field("amount", |p| &p.amount, |p, v| p.amount = v)
            .field("currency", |p| &p.currency, |p, v| p.currency = v)
            .build()
    }
}

// -----------------------------------------------------------------------------
// Shapes, scalars, filters

/// Written as `[left, right]`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pair {
    pub left: i32,
    pub right: i32,
}

impl Bean for Pair {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Pair")
            .with_default()
            .field("left", |p| &p.left, |p, v| p.left = v)
            .field("right", |p| &p.right, |p, v| p.right = v)
            .array_shape()
            .build()
    }
}

/// Decodes from a bare string as well as from an object.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Color {
    pub name: String,
}

impl Bean for Color {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Color")
            .with_default()
            .field("name", |c| &c.name, |c, v| c.name = v)
            .from_scalar(|token| match token {
                Token::String(name) => Ok(Color { name: name.clone() }),
                _ => Err(Error::invalid_value("a color name", token.kind().name())),
            })
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

impl Bean for Credentials {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Credentials")
            .with_default()
            .field("user", |c| &c.user, |c, v| c.user = v)
            .field("token", |c| &c.token, |c, v| c.token = v)
            .filter_id("secrets")
            .build()
    }
}

/// Ignores every unknown field on its own.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lenient {
    pub value: i32,
}

impl Bean for Lenient {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Lenient")
            .with_default()
            .field("value", |l| &l.value, |l, v| l.value = v)
            .ignore_unknown()
            .build()
    }
}
