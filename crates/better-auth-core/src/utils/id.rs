// Document id generation (nanoid, 21 characters by default).

pub fn generate_id() -> String {
    nanoid::nanoid!()
}

pub fn generate_id_with_length(len: usize) -> String {
    nanoid::nanoid!(len)
}
