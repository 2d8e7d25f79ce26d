#[rocket::launch]
fn rocket() -> _ {
    archive_reader::rocket()
}
