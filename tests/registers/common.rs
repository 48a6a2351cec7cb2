use csrfield::csr::{FieldDescriptor, Layout, LayoutResolver};

pub fn field(name: &str, size: usize) -> FieldDescriptor {
    FieldDescriptor::new(name, size).expect("valid field")
}

pub fn pinned(name: &str, size: usize, offset: usize) -> FieldDescriptor {
    FieldDescriptor::builder(name, size)
        .offset(offset)
        .build()
        .expect("valid field")
}

pub fn pulse(name: &str, size: usize) -> FieldDescriptor {
    FieldDescriptor::builder(name, size)
        .pulse(true)
        .build()
        .expect("valid field")
}

pub fn resolve(fields: Vec<FieldDescriptor>) -> Layout {
    LayoutResolver::new().resolve(fields).expect("layout resolves")
}

/// `(name, offset, size)` for every placed field, in declaration order.
pub fn placements(layout: &Layout) -> Vec<(String, usize, usize)> {
    layout
        .fields()
        .iter()
        .map(|f| (f.name().to_string(), f.offset(), f.size()))
        .collect()
}
