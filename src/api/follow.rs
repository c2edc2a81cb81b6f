use crate::api::{observe, redirect, State};
use crate::auth::LoggedIn;
use crate::datastore::Datastore;
use crate::follows;
use crate::twoface::Fallible;
use crate::urls;
use actix_web::{web, HttpResponse};

pub async fn follow<DS: Datastore>(
    state: web::Data<State<DS>>,
    username: web::Path<String>,
    user: LoggedIn,
) -> Fallible<HttpResponse> {
    observe("follow", || async {
        let author = follows::follow(&*state.ds, &user.0, &username).await?;
        Ok(redirect(&urls::profile(&author.username)))
    })
    .await
}

pub async fn unfollow<DS: Datastore>(
    state: web::Data<State<DS>>,
    username: web::Path<String>,
    user: LoggedIn,
) -> Fallible<HttpResponse> {
    observe("unfollow", || async {
        let author = follows::unfollow(&*state.ds, &user.0, &username).await?;
        Ok(redirect(&urls::profile(&author.username)))
    })
    .await
}

#[cfg(test)]
mod tests {
    use crate::api::{configure, testing};
    use crate::datastore::{mock, structs::Follow};
    use actix_web::{
        http::{header, StatusCode},
        test, App,
    };

    #[actix_rt::test]
    async fn test_follow_and_unfollow() {
        let ds = mock::Client::default();
        let alice = ds.add_user("alice");
        let bob = ds.add_user("bob");
        let media = testing::temp_media();
        let mut app = test::init_service(
            App::new()
                .data(testing::state(&ds, &media))
                .data(testing::sessions())
                .configure(configure::<mock::Client>),
        )
        .await;
        let edge = Follow {
            user_id: alice.id,
            author_id: bob.id,
        };

        // Once by form POST, once by following a link.
        let req = testing::logged_in(test::TestRequest::post().uri("/profile/bob/follow/"), &alice)
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/profile/bob/");
        let req = testing::logged_in(test::TestRequest::get().uri("/profile/bob/follow/"), &alice)
            .to_request();
        test::call_service(&mut app, req).await;
        assert_eq!(ds.follows(), vec![edge]);

        let req = testing::logged_in(test::TestRequest::post().uri("/profile/alice/follow/"), &alice)
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(ds.follows(), vec![edge]);

        let req =
            testing::logged_in(test::TestRequest::post().uri("/profile/bob/unfollow/"), &alice)
                .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/profile/bob/");
        assert!(ds.follows().is_empty());

        let req =
            testing::logged_in(test::TestRequest::post().uri("/profile/ghost/follow/"), &alice)
                .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/profile/bob/follow/").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fprofile%2Fbob%2Ffollow%2F"
        );
        assert!(ds.follows().is_empty());
    }
}
