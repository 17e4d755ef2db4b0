//! # Declaration Macro Tests
//!
//! `flat_struct!` must allocate fields in declaration order under the layout
//! rules and produce descriptors that forward to the store exactly like
//! hand-built ones.

use packdb::{flat_struct, Field, FlatArray, FlatDb, RangeField, Ref, StrRef};

flat_struct! {
    /// A lexer token: packed kind/flag plus a full line number.
    pub struct Token {
        pub kind: int(6),
        pub seen: bool,
        pub width: int(25),
        pub line: int,
        pub text: str,
        pub items: ref(Item),
    }
}

flat_struct! {
    pub struct Item {
        pub value: int,
        pub parent: ref(Token, 20),
    }
}

#[test]
fn fields_are_allocated_in_declaration_order() {
    let (layout, _) = TokenFields::build().unwrap();
    // 6 + 1 + 25 bits pack into word 0; line, text, items take words 1-3.
    assert_eq!(layout.bit_size(), 32 + 32 + 32 + 32);
    assert_eq!(layout.size(), 4);

    let (item_layout, _) = ItemFields::build().unwrap();
    assert_eq!(item_layout.bit_size(), 32 + 20);
    assert_eq!(item_layout.size(), 2);
}

#[test]
fn generated_descriptors_round_trip_values() {
    let (layout, fields) = TokenFields::build().unwrap();
    let mut tokens = FlatArray::new(&layout);
    let at = tokens.push();

    fields.kind.set(at, &mut tokens, 33);
    fields.seen.set(at, &mut tokens, true);
    fields.width.set(at, &mut tokens, 1 << 24);
    fields.line.set(at, &mut tokens, u32::MAX);
    fields.text.set(at, &mut tokens, StrRef::new(77));
    fields.items.set(at, &mut tokens, Ref::new(4));

    assert_eq!(fields.kind.get(at, &tokens), 33);
    assert!(fields.seen.get(at, &tokens));
    assert_eq!(fields.width.get(at, &tokens), 1 << 24);
    assert_eq!(fields.line.get(at, &tokens), u32::MAX);
    assert_eq!(fields.text.get(at, &tokens).offset(), 77);
    assert_eq!(fields.items.get(at, &tokens).offset(), 4);
}

#[test]
fn descriptors_satisfy_the_accessor_contract() {
    // The generated descriptors are usable through the Field trait, the
    // surface generated accessor code forwards to.
    fn roundtrip<F: Field<Token>>(field: &F, value: F::Value, array: &mut FlatArray<Token>, at: Ref<Token>) -> F::Value
    where
        F::Value: Copy,
    {
        field.set_value(at, array, value);
        field.get_value(at, array)
    }

    let (layout, fields) = TokenFields::build().unwrap();
    let mut tokens = FlatArray::new(&layout);
    let at = tokens.push();
    assert_eq!(roundtrip(&fields.kind, 12, &mut tokens, at), 12);
    assert!(roundtrip(&fields.seen, true, &mut tokens, at));
}

#[test]
fn declared_ref_fields_drive_range_views() {
    let (token_layout, token_fields) = TokenFields::build().unwrap();
    let (item_layout, _) = ItemFields::build().unwrap();

    let mut db = FlatDb::new();
    db.create_array(&token_layout).unwrap();
    db.create_array(&item_layout).unwrap();

    // One token owning two items.
    let items_begin = db.array::<Item>().unwrap().end();
    let tokens = db.array_mut::<Token>().unwrap();
    let at = tokens.push();
    token_fields.items.set(at, tokens, items_begin);
    db.array_mut::<Item>().unwrap().push_n(2);
    db.close_ranges::<Token>(&[&token_fields.items]).unwrap();

    let ranges = RangeField::new(token_fields.items, &token_layout, &item_layout);
    let tokens = db.array::<Token>().unwrap();
    assert_eq!(ranges.get(at, tokens).len(), 2);
}

#[test]
fn misdeclared_layout_fails_at_build() {
    flat_struct! {
        struct Lopsided {
            low: int(20),
            // A full word at bit 20 is misaligned.
            full: int,
        }
    }
    assert!(LopsidedFields::build().is_err());
}
