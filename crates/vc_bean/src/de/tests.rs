use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use alloc::{format, vec};
use core::any::TypeId;
use std::sync::Mutex;

use serde_json::json;
use vc_token::{Token, TokenBuffer, TokenError, TokenKind, TokenReader, TokenWriter};

use crate::fixtures::*;
use crate::{
    Bean, BeanMapper, BeanMeta, BeanRegistry, Codec, DecodeContext, DeserializerAdvice, Error,
    ErrorKind, MapperConfig, UnknownPropertyPolicy,
};

fn mapper<T: Bean>() -> BeanMapper {
    let mut registry = BeanRegistry::new();
    registry.register::<T>();
    BeanMapper::new(registry)
}

fn cause(error: &Error) -> &ErrorKind {
    match error.kind() {
        ErrorKind::PropertyAssignment { cause, .. } => cause,
        kind => kind,
    }
}

// -----------------------------------------------------------------------------
// Advice

struct CapturePassword;

impl DeserializerAdvice<User> for CapturePassword {
    fn intercept(
        &self,
        bean: &mut User,
        property: &str,
        reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        if property != "password" {
            return Ok(false);
        }
        bean.password = reader.text().map(String::from);
        Ok(true)
    }
}

#[test]
fn intercepted_password_is_captured_but_never_written() {
    let mut registry = BeanRegistry::new();
    registry.bind_deserializer_advice::<User, _>(CapturePassword);
    let mapper = BeanMapper::new(registry);

    let user: User = mapper
        .from_json(r#"{"firstName":"Sponge","lastName":"Bob","password":"secret"}"#)
        .unwrap();
    assert_eq!(user.first_name, "Sponge");
    assert_eq!(user.last_name, "Bob");
    assert_eq!(user.password.as_deref(), Some("secret"));

    let plain = self::mapper::<User>();
    assert_eq!(
        plain.to_json(&user).unwrap(),
        r#"{"firstName":"Sponge","lastName":"Bob"}"#
    );
}

#[test]
fn ignorable_field_without_advice_is_skipped() {
    let user: User = mapper::<User>()
        .from_json(r#"{"password":{"nested":[1,2]},"firstName":"A"}"#)
        .unwrap();
    assert_eq!(user.first_name, "A");
    assert_eq!(user.password, None);
}

#[derive(Debug, Default)]
struct Traced {
    value: i32,
    events: Vec<String>,
}

impl Bean for Traced {
    fn describe() -> BeanMeta {
        BeanMeta::builder::<Self>("Traced")
            .with_default()
            .field("value", |t| &t.value, |t, v| {
                t.events.push(format!("assign {v}"));
                t.value = v;
            })
            .deserializer_advice(Recorder)
            .build()
    }
}

struct Recorder;

impl DeserializerAdvice<Traced> for Recorder {
    fn before(
        &self,
        bean: &mut Traced,
        reader: &dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        bean.events.push(format!("before at {:?}", reader.kind()));
        Ok(())
    }

    fn intercept(
        &self,
        bean: &mut Traced,
        property: &str,
        reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        bean.events.push(format!("intercept {property}"));
        if property == "skipped" {
            reader.skip_children()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn after(
        &self,
        bean: &mut Traced,
        reader: &dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        bean.events.push(format!("after at {:?}", reader.kind()));
        Ok(())
    }
}

#[test]
fn hooks_run_once_and_in_order() {
    let mapper = mapper::<Traced>()
        .with_config(MapperConfig::default().with_unknown_properties(UnknownPropertyPolicy::Ignore));
    let traced: Traced = mapper
        .from_json(r#"{"value":1,"skipped":{"value":2},"other":3}"#)
        .unwrap();

    assert_eq!(traced.value, 1);
    assert_eq!(
        traced.events,
        [
            "before at Some(FieldName)",
            "intercept value",
            "assign 1",
            "intercept skipped",
            "intercept other",
            "after at Some(EndObject)",
        ]
    );
}

#[test]
fn hooks_run_for_empty_objects() {
    let traced: Traced = mapper::<Traced>().from_json("{}").unwrap();
    assert_eq!(
        traced.events,
        ["before at Some(EndObject)", "after at Some(EndObject)"]
    );
}

struct ClaimAll;

impl DeserializerAdvice<Person> for ClaimAll {
    fn intercept(
        &self,
        _bean: &mut Person,
        property: &str,
        reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        match property {
            "address" => {
                reader.skip_children()?;
                Ok(true)
            }
            "name" => Ok(true),
            _ => Ok(false),
        }
    }
}

#[test]
fn claimed_fields_are_not_assigned() {
    let mut registry = BeanRegistry::new();
    registry.bind_deserializer_advice::<Person, _>(ClaimAll);
    let mapper = BeanMapper::new(registry);

    let person: Person = mapper
        .from_json(r#"{"name":"Ann","address":{"zip":1,"city":"X"},"age":30}"#)
        .unwrap();
    assert_eq!(person.name, "");
    assert_eq!(person.address, Address::default());
    assert_eq!(person.age, 30);
}

struct LeaveOpen;

impl DeserializerAdvice<Person> for LeaveOpen {
    fn intercept(
        &self,
        _bean: &mut Person,
        property: &str,
        _reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        Ok(property == "address")
    }
}

#[test]
fn advice_leaving_a_structure_open_is_detected() {
    let mut registry = BeanRegistry::new();
    registry.bind_deserializer_advice::<Person, _>(LeaveOpen);
    let mapper = BeanMapper::new(registry);

    let error = mapper
        .from_json::<Person>(r#"{"address":{"zip":1},"age":3}"#)
        .unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::AdviceDesync { bean_type: "Person", property } if property == "address"
    ));

    // Claiming a scalar without moving is fine.
    let person: Person = mapper.from_json(r#"{"address":null,"age":3}"#).unwrap();
    assert_eq!(person.age, 3);
}

// -----------------------------------------------------------------------------
// Hook order across decode variants

/// Records the decode hooks of any bean type it is bound to.
#[derive(Clone, Default)]
struct HookLog(Arc<Mutex<Vec<String>>>);

impl HookLog {
    fn push(&self, event: String) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }

    fn take(&self) -> Vec<String> {
        self.0.lock().map(|mut events| core::mem::take(&mut *events)).unwrap_or_default()
    }
}

impl<T: 'static> DeserializerAdvice<T> for HookLog {
    fn before(
        &self,
        _bean: &mut T,
        _reader: &dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        self.push("before".into());
        Ok(())
    }

    fn intercept(
        &self,
        _bean: &mut T,
        property: &str,
        _reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        self.push(format!("intercept {property}"));
        Ok(false)
    }

    fn after(
        &self,
        _bean: &mut T,
        _reader: &dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        self.push("after".into());
        Ok(())
    }
}

fn logged<T: Bean>() -> (BeanMapper, HookLog) {
    let log = HookLog::default();
    let mut registry = BeanRegistry::new();
    registry.bind_deserializer_advice::<T, _>(log.clone());
    (BeanMapper::new(registry), log)
}

#[test]
fn hooks_wrap_view_filtered_beans() {
    let (mapper, log) = logged::<Profile>();
    let profile: Profile = mapper
        .with_view("public")
        .from_json(r#"{"name":"a","email":"e","bio":"b"}"#)
        .unwrap();
    assert_eq!(profile.email, "");
    assert_eq!(
        log.take(),
        ["before", "intercept name", "intercept email", "intercept bio", "after"]
    );
}

#[test]
fn hooks_wrap_beans_with_unwrapped_children() {
    let (mapper, log) = logged::<Customer>();
    let customer: Customer = mapper
        .from_json(r#"{"home_city":"Paris","name":"Ann"}"#)
        .unwrap();
    assert_eq!(customer.home.city, "Paris");
    assert_eq!(
        log.take(),
        ["before", "intercept home_city", "intercept name", "after"]
    );
}

#[test]
fn hooks_wrap_beans_with_external_type_ids() {
    let (mapper, log) = logged::<Envelope>();
    let envelope: Envelope = mapper
        .from_json(r#"{"payload":4,"type":"count","id":2}"#)
        .unwrap();
    assert_eq!(envelope.payload, Payload::Count(4));
    assert_eq!(
        log.take(),
        ["before", "intercept payload", "intercept type", "intercept id", "after"]
    );
}

#[test]
fn hooks_wrap_each_identified_bean_once() {
    let log = HookLog::default();
    let mut registry = BeanRegistry::new();
    registry
        .register::<Team>()
        .bind_deserializer_advice::<Employee, _>(log.clone());
    let mapper = BeanMapper::new(registry);

    let team: Team = mapper
        .from_json(r#"{"members":[{"@id":1,"name":"A"},{"@id":2,"name":"B","manager":1}]}"#)
        .unwrap();
    assert_eq!(team.members.len(), 2);
    assert_eq!(
        log.take(),
        [
            "before",
            "intercept @id",
            "intercept name",
            "after",
            "before",
            "intercept @id",
            "intercept name",
            "intercept manager",
            "after",
        ]
    );
}

#[test]
fn hooks_of_the_built_subtype_run_on_replay() {
    let log = HookLog::default();
    let mut registry = BeanRegistry::new();
    registry
        .register::<Pet>()
        .bind_deserializer_advice::<Dog, _>(log.clone());
    let mapper = BeanMapper::new(registry);

    let pet: Pet = mapper
        .from_json(r#"{"name":"Rex","kind":"dog","good":true}"#)
        .unwrap();
    assert!(matches!(pet, Pet::Dog(Dog { good: true, .. })));
    assert_eq!(
        log.take(),
        ["before", "intercept name", "intercept good", "after"]
    );
}

// -----------------------------------------------------------------------------
// Creators

#[test]
fn creator_parameters_in_any_order() {
    let mapper = mapper::<Point>();
    let point: Point = mapper.from_json(r#"{"label":"a","y":2,"x":1}"#).unwrap();
    assert_eq!(
        point,
        Point {
            x: 1,
            y: 2,
            label: "a".into()
        }
    );

    let point: Point = mapper.from_json(r#"{"x":1,"label":"b"}"#).unwrap();
    assert_eq!((point.x, point.y, point.label.as_str()), (1, 0, "b"));
}

#[test]
fn missing_creator_parameter_fails_construction() {
    let error = mapper::<Point>().from_json::<Point>(r#"{"y":1}"#).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::Construction { bean_type: "Point", .. }
    ));
    assert!(error.to_string().contains("\"x\""));
}

struct ReplayLog;

impl DeserializerAdvice<Point> for ReplayLog {
    fn intercept(
        &self,
        bean: &mut Point,
        property: &str,
        _reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        bean.label.push_str(&format!("[{property}]"));
        Ok(property == "label")
    }
}

#[test]
fn creator_beans_see_advice_on_replay() {
    let mut registry = BeanRegistry::new();
    registry.bind_deserializer_advice::<Point, _>(ReplayLog);
    let mapper = BeanMapper::new(registry);

    // Creator parameters are consumed by the creator and never replayed.
    let point: Point = mapper.from_json(r#"{"y":2,"label":"p","x":1}"#).unwrap();
    assert_eq!((point.x, point.y, point.label.as_str()), (1, 2, "[label]"));
}

#[test]
fn creator_builds_registered_subtypes() {
    let mapper = mapper::<Pet>();
    let pet: Pet = mapper
        .from_json(r#"{"name":"Rex","kind":"dog","good":true}"#)
        .unwrap();
    assert_eq!(
        pet,
        Pet::Dog(Dog {
            kind: "dog".into(),
            name: "Rex".into(),
            good: true
        })
    );

    let pet: Pet = mapper.from_json(r#"{"kind":"cat","name":"Tom"}"#).unwrap();
    let Pet::Cat(cat) = pet else {
        panic!("expected a cat");
    };
    assert_eq!((cat.name.as_str(), cat.lives), ("Tom", 9));
}

#[test]
fn unregistered_subtype_is_unresolvable() {
    let mapper = mapper::<Pet>();
    let error = mapper.from_json::<Pet>(r#"{"kind":"fish"}"#).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::UnresolvableType { base_type: "Pet", type_id: None }
    ));

    let error = mapper.from_json::<Pet>(r#"{"kind":"bird"}"#).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Construction { .. }));
}

// -----------------------------------------------------------------------------
// Views, unwrapping, external type ids

#[test]
fn properties_outside_the_view_are_skipped() {
    let text = r#"{"name":"a","email":"e","bio":"b"}"#;
    let mapper = mapper::<Profile>();

    let public: Profile = mapper.with_view("public").from_json(text).unwrap();
    assert_eq!((public.name.as_str(), public.email.as_str(), public.bio.as_str()), ("a", "", "b"));

    let private: Profile = mapper.with_view("private").from_json(text).unwrap();
    assert_eq!(private.email, "e");

    let all: Profile = mapper.from_json(text).unwrap();
    assert_eq!(all.email, "e");
}

#[test]
fn unwrapped_fields_with_prefix() {
    let customer: Customer = mapper::<Customer>()
        .from_json(r#"{"home_city":"Paris","name":"Ann","home_zip":75001}"#)
        .unwrap();
    assert_eq!(customer.name, "Ann");
    assert_eq!(
        customer.home,
        Address {
            street: String::new(),
            city: "Paris".into(),
            zip: 75001
        }
    );
}

#[test]
fn nested_unwrapping_feeds_the_catch_all_too() {
    let order: Order = mapper::<Order>()
        .from_json(r#"{"c_home_street":"Main","number":7,"c_name":"Bo","note":"x"}"#)
        .unwrap();
    assert_eq!(order.number, 7);
    assert_eq!(order.customer.name, "Bo");
    assert_eq!(order.customer.home.street, "Main");
    assert_eq!(order.extra.get("note"), Some(&json!("x")));
    assert_eq!(order.extra.get("c_name"), Some(&json!("Bo")));
    assert_eq!(order.extra.len(), 3);
}

#[test]
fn external_type_id_before_or_after_the_value() {
    let mapper = mapper::<Envelope>();

    let before: Envelope = mapper
        .from_json(r#"{"type":"text","payload":"hi","id":1}"#)
        .unwrap();
    assert_eq!(before.payload, Payload::Text("hi".into()));

    let after: Envelope = mapper
        .from_json(r#"{"payload":{"city":"Oslo"},"id":2,"type":"place"}"#)
        .unwrap();
    assert_eq!(after.id, 2);
    let Payload::Place(address) = after.payload else {
        panic!("expected a place");
    };
    assert_eq!(address.city, "Oslo");
}

#[test]
fn external_type_id_errors() {
    let mapper = mapper::<Envelope>();

    let error = mapper
        .from_json::<Envelope>(r#"{"type":"color","payload":1}"#)
        .unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::UnresolvableType { type_id: Some(id), .. } if id == "color"
    ));
    assert_eq!(error.path()[0].to_string(), "Envelope[\"payload\"]");

    let error = mapper.from_json::<Envelope>(r#"{"payload":1}"#).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::MissingTypeId { property: "payload", type_property: "type" }
    ));

    // A type id without a value leaves the default.
    let envelope: Envelope = mapper.from_json(r#"{"type":"text"}"#).unwrap();
    assert_eq!(envelope.payload, Payload::default());
}

#[test]
fn type_id_that_is_also_a_creator_property() {
    let mapper = mapper::<Document>();
    let document: Document = mapper
        .from_json(r#"{"body":"hello","format":"text"}"#)
        .unwrap();
    assert_eq!(document.format, "text");
    assert_eq!(document.body, Payload::Text("hello".into()));

    let document: Document = mapper
        .from_json(r#"{"format":"count","body":12}"#)
        .unwrap();
    assert_eq!(document.body, Payload::Count(12));
}

// -----------------------------------------------------------------------------
// Identity

#[test]
fn shared_references_resolve_to_the_same_arc() {
    let team: Team = mapper::<Team>()
        .from_json(
            r#"{"members":[
                {"@id":1,"name":"Ann","manager":{"@id":2,"name":"Boss","manager":null}},
                {"@id":3,"name":"Bob","manager":2}
            ]}"#,
        )
        .unwrap();

    let [ann, bob] = team.members.as_slice() else {
        panic!("expected two members");
    };
    let (Some(first), Some(second)) = (&ann.manager, &bob.manager) else {
        panic!("both members have a manager");
    };
    assert!(Arc::ptr_eq(first, second));
    assert_eq!(first.name, "Boss");
}

#[test]
fn unknown_reference_fails() {
    let error = mapper::<Team>()
        .from_json::<Team>(r#"{"members":[5]}"#)
        .unwrap_err();
    assert!(matches!(cause(&error), ErrorKind::UnresolvedReference { id } if id == "5"));
    assert_eq!(error.path()[0].to_string(), "Team[\"members\"]");
}

#[test]
fn identities_live_as_long_as_the_context() {
    let mapper = mapper::<Price>();
    let mut ctx = mapper.decode_context();

    let usd = vc_token::json::from_str(r#"{"code":"USD","digits":2}"#).unwrap();
    let currency = <Arc<Currency>>::decode(&mut usd.reader(), &mut ctx).unwrap();
    assert_eq!(ctx.identity_count(), 1);

    let price = vc_token::json::from_str(r#"{"amount":5,"currency":"USD"}"#).unwrap();
    let price: Price = mapper.decode_with(&mut ctx, &mut price.reader()).unwrap();
    assert!(Arc::ptr_eq(price.currency.as_ref().unwrap(), &currency));

    let fresh = vc_token::json::from_str(r#"{"amount":5,"currency":"USD"}"#).unwrap();
    assert!(mapper.decode::<Price>(&mut fresh.reader()).is_err());
}

#[test]
fn native_object_ids_are_recorded() {
    let mapper = mapper::<Team>();
    let mut buffer = TokenBuffer::new();
    buffer.annotate_object_id(Token::from(7_i64));
    buffer.write_start_object().unwrap();
    buffer.write_string_field("name", "Native").unwrap();
    buffer.write_end_object().unwrap();

    let mut ctx = mapper.decode_context();
    let employee = <Arc<Employee>>::decode(&mut buffer.reader(), &mut ctx).unwrap();

    let reference = TokenBuffer::from_tokens(vec![Token::from(7_i64)]);
    let again = <Arc<Employee>>::decode(&mut reference.reader(), &mut ctx).unwrap();
    assert!(Arc::ptr_eq(&employee, &again));
}

// -----------------------------------------------------------------------------
// Unknown properties

#[test]
fn unknown_property_dispositions() {
    let text = r#"{"value":1,"extra":[1,{"a":2}]}"#;

    let error = mapper::<Traced>().from_json::<Traced>(text).unwrap_err();
    assert!(matches!(
        cause(&error),
        ErrorKind::UnknownProperty { bean_type: "Traced", property } if property == "extra"
    ));
    assert_eq!(error.path()[0].to_string(), "Traced[\"extra\"]");

    let lenient: Lenient = mapper::<Lenient>().from_json(text).unwrap();
    assert_eq!(lenient.value, 1);

    let settings: Settings = mapper::<Settings>()
        .from_json(r#"{"theme":"dark","name":"s","size":[1,2]}"#)
        .unwrap();
    assert_eq!(settings.name, "s");
    assert_eq!(settings.extra.get("theme"), Some(&json!("dark")));
    assert_eq!(settings.extra.get("size"), Some(&json!([1, 2])));
}

// -----------------------------------------------------------------------------
// Failures

#[test]
fn nested_failures_carry_the_reference_chain() {
    let error = mapper::<Person>()
        .from_json::<Person>(r#"{"name":"a","address":{"city":"c","zip":"abc"}}"#)
        .unwrap_err();

    let ErrorKind::PropertyAssignment {
        bean_type,
        property,
        location,
        cause,
    } = error.kind()
    else {
        panic!("unexpected kind {:?}", error.kind());
    };
    assert_eq!((*bean_type, &**property), ("Address", "zip"));
    assert_eq!(location.as_ref().map(ToString::to_string).as_deref(), Some("/address/zip"));
    assert!(matches!(**cause, ErrorKind::InvalidValue { expected: "i32", .. }));
    assert!(error.to_string().ends_with(
        "(through reference chain: Person[\"address\"]->Address[\"zip\"])"
    ));
}

#[test]
fn failed_objects_are_consumed() {
    let registry = {
        let mut registry = BeanRegistry::new();
        registry.register::<Person>();
        registry
    };
    let config = MapperConfig::default();
    let buffer = vc_token::json::from_str(
        r#"[{"age":"bad","address":{"zip":1},"name":"x"},{"name":"ok"}]"#,
    )
    .unwrap();
    let mut reader = buffer.reader();
    let mut ctx = DecodeContext::new(&registry, &config);

    reader.advance().unwrap();
    assert!(ctx.decode_bean::<Person>(&mut reader).is_err());
    assert_eq!(reader.kind(), Some(TokenKind::EndObject));
    assert_eq!(reader.depth(), 1);

    reader.advance().unwrap();
    let person = ctx.decode_bean::<Person>(&mut reader).unwrap();
    assert_eq!(person.name, "ok");
    assert_eq!(reader.kind(), Some(TokenKind::EndObject));
}

#[test]
fn failed_populate_is_consumed() {
    let mapper = mapper::<User>();
    let text = r#"{"firstName":"a","bogus":{"x":1},"lastName":"b"}"#;

    let buffer = vc_token::json::from_str(text).unwrap();
    let mut reader = buffer.reader();
    let mut user = User::default();
    assert!(mapper.decode_into(&mut reader, &mut user).is_err());
    assert_eq!(user.first_name, "a");
    assert_eq!(reader.kind(), Some(TokenKind::EndObject));
    assert_eq!(reader.depth(), 0);

    // Starting on the first field instead of the opening brace.
    let mut reader = buffer.reader();
    reader.advance().unwrap();
    assert_eq!(reader.kind(), Some(TokenKind::FieldName));
    let mut user = User::default();
    assert!(mapper.decode_into(&mut reader, &mut user).is_err());
    assert_eq!(reader.kind(), Some(TokenKind::EndObject));
    assert_eq!(reader.depth(), 0);

    let mut reader = buffer.reader();
    reader.advance().unwrap();
    let mut ctx = mapper.decode_context();
    assert!(ctx.decode_bean::<User>(&mut reader).is_err());
    assert_eq!(reader.kind(), Some(TokenKind::EndObject));
    assert_eq!(reader.depth(), 0);
}

#[test]
fn truncated_input_names_the_expected_token() {
    let buffer = TokenBuffer::from_tokens(vec![Token::StartObject, Token::field("name")]);
    let error = mapper::<Person>()
        .decode::<Person>(&mut buffer.reader())
        .unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::Structural(TokenError::UnexpectedEnd { expected: "a field value" })
    ));
}

#[test]
fn recursion_is_bounded() {
    let mapper = mapper::<Node>();
    let text = mapper.to_json(&Node::chain(10)).unwrap();

    let decoded: Node = mapper.from_json(&text).unwrap();
    assert_eq!(decoded, Node::chain(10));

    let shallow = mapper.with_config(MapperConfig::default().with_max_depth(5));
    let error = shallow.from_json::<Node>(&text).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::RecursionExhausted { limit: 5 }));
    assert_eq!(error.path().len(), 5);
}

// -----------------------------------------------------------------------------
// Other shapes and entry points

#[test]
fn array_shape_and_scalar_creators() {
    let pair: Pair = mapper::<Pair>().from_json("[3,4]").unwrap();
    assert_eq!(pair, Pair { left: 3, right: 4 });
    assert!(mapper::<Pair>().from_json::<Pair>("[1,2,3]").is_err());

    let mapper = mapper::<Color>();
    let red: Color = mapper.from_json(r#""red""#).unwrap();
    assert_eq!(red.name, "red");
    let blue: Color = mapper.from_json(r#"{"name":"blue"}"#).unwrap();
    assert_eq!(blue.name, "blue");
    assert!(mapper.from_json::<Color>("1").is_err());
}

#[test]
fn decode_into_keeps_unset_fields() {
    let mapper = mapper::<User>();
    let mut user = User {
        first_name: "Keep".into(),
        last_name: "Old".into(),
        password: Some("pw".into()),
    };

    let buffer = vc_token::json::from_str(r#"{"lastName":"New"}"#).unwrap();
    mapper.decode_into(&mut buffer.reader(), &mut user).unwrap();
    assert_eq!(user.first_name, "Keep");
    assert_eq!(user.last_name, "New");
    assert_eq!(user.password.as_deref(), Some("pw"));
}

#[test]
fn decode_by_type_id() {
    let mapper = mapper::<Person>();
    let buffer = vc_token::json::from_str(r#"{"name":"dyn","age":1}"#).unwrap();
    let bean = mapper
        .decode_dyn(TypeId::of::<Person>(), &mut buffer.reader())
        .unwrap();
    assert_eq!(bean.downcast_ref::<Person>().map(|p| p.age), Some(1));

    let buffer = vc_token::json::from_str("{}").unwrap();
    let error = mapper
        .decode_dyn(TypeId::of::<String>(), &mut buffer.reader())
        .unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Unregistered { .. }));
}

#[test]
fn mappers_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeanMapper>();
    assert_send_sync::<BeanRegistry>();
    assert_send_sync::<BeanMeta>();
}
