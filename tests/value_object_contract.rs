//! Purpose: Contract tests for compile-time value objects declared with `record!`.
//! Exports: Integration tests only.
//! Role: Exercise the public facade (`to_dict`, `to_json`, `from_dict`, `from_json`, `default`).
//! Invariants: Decoding a record's own projection reproduces an equal record.
//! Invariants: Failures surface as typed `ErrorKind`s with field paths.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use classy::api::{ErrorKind, Mutability, Policy, Value, ValueObject};
use classy::record;
use serde_json::{Map, Value as JsonValue, json};
use time::macros::{date, datetime, time};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

record! {
    #[immutable]
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Student {
        name: String,
    }
}

record! {
    #[immutable]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Classroom {
        name: String,
        student: Student,
        students_list: Vec<Student>,
        students_dict: BTreeMap<String, Student>,
        random_things: (String, i64, Student),
    }
}

record! {
    #[mutable]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Person {
        name: String,
        age: i64,
        job: String,
    }
}

record! {
    #[immutable]
    #[derive(Debug)]
    pub struct HasTuple {
        tuples: (String, String, i64, Uuid, PrimitiveDateTime, Date, Time),
    }
}

record! {
    #[immutable]
    #[derive(Debug)]
    pub struct ShortTuple {
        tuples: (i64, String, String),
    }
}

record! {
    #[immutable]
    #[derive(Debug, PartialEq)]
    pub struct HasSupportedTypes {
        id: Uuid,
        timestamp: PrimitiveDateTime,
        only_date: Date,
        only_time: Time,
        string: String,
    }
}

record! {
    #[immutable]
    #[derive(Debug)]
    pub struct Roster {
        members: BTreeSet<Student>,
        tags: BTreeSet<String>,
        seats: HashMap<String, u32>,
        scores: Vec<f64>,
        extra: JsonValue,
    }
}

record! {
    #[immutable]
    #[derive(Debug, PartialEq)]
    pub struct TreeNode {
        label: String,
        children: Vec<TreeNode>,
    }
}

record! {
    #[immutable]
    #[derive(Debug)]
    pub struct Session {
        user: String,
        _token: String,
    }
}

fn sarah() -> Student {
    Student::new("Sarah".to_string())
}

fn student(name: &str) -> Student {
    Student::new(name.to_string())
}

fn software_engineering() -> Classroom {
    Classroom::new(
        "Software Engineering".to_string(),
        sarah(),
        vec![student("John"), student("Sarah"), student("Michael")],
        ["John", "Sarah", "Michael"]
            .into_iter()
            .map(|name| (name.to_string(), student(name)))
            .collect(),
        ("random".to_string(), 0, student("John")),
    )
}

fn object(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn nested_records_project_to_nested_objects() {
    let expected = json!({
        "name": "Software Engineering",
        "student": {"name": "Sarah"},
        "students_list": [{"name": "John"}, {"name": "Sarah"}, {"name": "Michael"}],
        "students_dict": {
            "John": {"name": "John"},
            "Sarah": {"name": "Sarah"},
            "Michael": {"name": "Michael"}
        },
        "random_things": ["random", 0, {"name": "John"}]
    });
    let classroom = software_engineering();
    assert_eq!(JsonValue::Object(classroom.to_dict()), expected);
    assert_eq!(Classroom::from_dict(&object(expected)).unwrap(), classroom);
}

#[test]
fn json_text_keeps_declared_field_order() {
    let classroom = software_engineering();
    assert_eq!(
        classroom.to_json().unwrap(),
        concat!(
            r#"{"name":"Software Engineering","student":{"name":"Sarah"},"#,
            r#""students_list":[{"name":"John"},{"name":"Sarah"},{"name":"Michael"}],"#,
            r#""students_dict":{"John":{"name":"John"},"Michael":{"name":"Michael"},"Sarah":{"name":"Sarah"}},"#,
            r#""random_things":["random",0,{"name":"John"}]}"#
        )
    );

    let text = r#"{"name": "Software Engineering", "student": {"name": "Sarah"}, "students_list": [{"name": "John"}, {"name": "Sarah"}, {"name": "Michael"}], "students_dict": {"John": {"name": "John"}, "Sarah": {"name": "Sarah"}, "Michael": {"name": "Michael"}}, "random_things": ["random", 0, {"name": "John"}]}"#;
    assert_eq!(Classroom::from_json(text).unwrap(), classroom);
    assert_eq!(Classroom::from_json(&classroom.to_json().unwrap()).unwrap(), classroom);
}

#[test]
fn default_produces_zero_values_recursively() {
    let expected = Classroom::new(
        String::new(),
        Student::default().unwrap(),
        Vec::new(),
        BTreeMap::new(),
        (String::new(), 0, Student::default().unwrap()),
    );
    assert_eq!(Classroom::default().unwrap(), expected);
    assert_eq!(Student::default().unwrap().name(), "");
}

#[test]
fn default_fills_every_tuple_position() {
    let default = HasTuple::default().unwrap();
    let (first, second, count, id, _, _, _) = default.tuples();
    assert_eq!(first, "");
    assert_eq!(second, "");
    assert_eq!(*count, 0);
    assert_ne!(*id, HasTuple::default().unwrap().tuples().3);
}

#[test]
fn fixed_tuple_with_wrong_length_is_a_schema_error() {
    let err = ShortTuple::from_dict(&object(json!({"tuples": [0, "", "", ""]}))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert_eq!(err.field(), Some("tuples"));

    let ok = ShortTuple::from_dict(&object(json!({"tuples": [0, "a", "b"]}))).unwrap();
    assert_eq!(ok.tuples(), &(0, "a".to_string(), "b".to_string()));
}

#[test]
fn well_known_scalars_parse_from_canonical_text() {
    let id = Uuid::new_v4();
    let input = json!({
        "id": id.simple().to_string(),
        "timestamp": "2024-05-06T07:08:09.123456",
        "only_date": "2024-05-06",
        "only_time": "07:08:09.5",
        "string": "a"
    });
    let decoded = HasSupportedTypes::from_dict(&object(input)).unwrap();
    assert_eq!(
        decoded,
        HasSupportedTypes::new(
            id,
            datetime!(2024-05-06 07:08:09.123456),
            date!(2024 - 05 - 06),
            time!(07:08:09.5),
            "a".to_string(),
        )
    );
    assert_eq!(
        JsonValue::Object(decoded.to_dict()),
        json!({
            "id": id.hyphenated().to_string(),
            "timestamp": "2024-05-06T07:08:09.123456",
            "only_date": "2024-05-06",
            "only_time": "07:08:09.5",
            "string": "a"
        })
    );

    let err = HasSupportedTypes::from_dict(&object(json!({
        "id": "not-an-id",
        "timestamp": "2024-05-06T07:08:09",
        "only_date": "2024-05-06",
        "only_time": "07:08:09",
        "string": "a"
    })))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.field(), Some("id"));
}

#[test]
fn uuid_serializes_as_hyphenated_text() {
    record! {
        #[immutable]
        pub struct HasId {
            id: Uuid,
        }
    }
    let id = Uuid::new_v4();
    assert_eq!(HasId::new(id).to_json().unwrap(), format!(r#"{{"id":"{id}"}}"#));
}

#[test]
fn primitives_decode_and_wrong_shapes_fail_with_paths() {
    let person = Person::from_dict(&object(json!({"name": "John", "age": 29, "job": "Doctor"}))).unwrap();
    assert_eq!(person.name, "John");
    assert_eq!(person.age, 29);

    let err = Person::from_dict(&object(json!({"name": "John", "age": "29", "job": "Doctor"}))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mismatch);
    assert_eq!(err.field(), Some("age"));

    let mut classroom = JsonValue::Object(software_engineering().to_dict());
    classroom["students_list"][1]["name"] = json!(5);
    let err = Classroom::from_dict(&object(classroom)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mismatch);
    assert_eq!(err.field(), Some("students_list[1].name"));
}

#[test]
fn unknown_keys_are_ignored_and_missing_fields_fail() {
    let student = Student::from_dict(&object(json!({"name": "Ana", "nickname": "A"}))).unwrap();
    assert_eq!(student.name(), "Ana");

    let err = Person::from_dict(&object(json!({"name": "John"}))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert!(err.message().unwrap().contains("`age`, `job`"));
}

#[test]
fn mutable_records_allow_reassignment() {
    let mut person = Person::new("John".to_string(), 29, "Doctor".to_string());
    person.name = "Sarah".to_string();
    assert_eq!(person.name, "Sarah");
    assert_eq!(
        JsonValue::Object(person.to_dict()),
        json!({"name": "Sarah", "age": 29, "job": "Doctor"})
    );
}

#[test]
fn policies_are_fixed_per_type() {
    assert_eq!(<<Student as ValueObject>::Policy as Policy>::MUTABILITY, Mutability::Immutable);
    assert_eq!(<<Person as ValueObject>::Policy as Policy>::MUTABILITY, Mutability::Mutable);

    let mut record = sarah().to_record();
    let err = record.set("name", Value::from("John")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Frozen);

    let mut record = Person::new("John".to_string(), 29, "Doctor".to_string()).to_record();
    record.set("job", Value::from("Nurse")).unwrap();
    let person = Person::from_record(record).unwrap();
    assert_eq!(person.job, "Nurse");
}

#[test]
fn opted_in_equality_and_hash_follow_field_values() {
    let (t1, t2, t3) = (student("John"), student("John"), student("Sarah"));
    assert_eq!(t1, t2);
    assert_ne!(t1, t3);
    assert_eq!(hash_of(&t1), hash_of(&t2));
    assert_ne!(hash_of(&t1), hash_of(&t3));
}

#[test]
fn sets_maps_and_opaque_fields_decode() {
    let roster = Roster::from_dict(&object(json!({
        "members": [{"name": "A"}, {"name": "B"}, {"name": "A"}],
        "tags": ["x", "y", "x"],
        "seats": {"A": 1, "B": 2},
        "scores": [1, 2.5],
        "extra": {"anything": [true, null]}
    })))
    .unwrap();
    assert_eq!(roster.members().len(), 2);
    assert_eq!(roster.tags().len(), 2);
    assert_eq!(roster.seats().get("B"), Some(&2));
    assert_eq!(roster.scores(), &[1.0, 2.5]);
    assert_eq!(roster.extra(), &json!({"anything": [true, null]}));

    let empty = Roster::default().unwrap();
    assert!(empty.members().is_empty());
    assert!(empty.seats().is_empty());
    assert_eq!(empty.extra(), &JsonValue::Null);
}

#[test]
fn text_keyed_maps_survive_a_round_trip() {
    let roster = Roster::from_dict(&object(json!({
        "members": [],
        "tags": [],
        "seats": {"A": 1, "B": 2},
        "scores": [],
        "extra": null
    })))
    .unwrap();
    let again = Roster::from_dict(&roster.to_dict()).unwrap();
    assert_eq!(again.seats(), roster.seats());
    assert_eq!(again.seats().len(), 2);
}

#[test]
fn records_may_nest_their_own_type() {
    let tree = TreeNode::from_dict(&object(json!({
        "label": "root",
        "children": [{"label": "leaf", "children": []}, {"label": "branch", "children": [{"label": "twig", "children": []}]}]
    })))
    .unwrap();
    assert_eq!(tree.children().len(), 2);
    assert_eq!(tree.children()[1].children()[0].label(), "twig");
    assert_eq!(TreeNode::from_json(&tree.to_json().unwrap()).unwrap(), tree);

    let empty = TreeNode::default().unwrap();
    assert_eq!(empty, TreeNode::new(String::new(), Vec::new()));
}

#[test]
fn private_fields_stay_out_of_the_projection() {
    let session = Session::new("sarah".to_string(), "secret".to_string());
    assert_eq!(session._token(), "secret");
    assert_eq!(JsonValue::Object(session.to_dict()), json!({"user": "sarah"}));
}

#[test]
fn from_json_reports_malformed_text_and_non_objects() {
    let err = Student::from_json(r#"{"name": "#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Json);
    assert!(err.hint().unwrap().contains("context: Student"));

    let err = Student::from_json(r#"["Sarah"]"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mismatch);
}
