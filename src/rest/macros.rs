/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

// Implements ListEnvelope for a response whose page sits in one of several
// optional container fields. Containers need `pages` and `items` fields and
// items need a `client` field.
macro_rules! list_envelope {
    ( $envelope:ty, $item:ty, $( $container:ident ),+ ) => {
        impl $crate::rest::paginator::ListEnvelope for $envelope {
            type Item = $item;

            fn into_page(
                self,
                client: &$crate::rest::Client,
            ) -> Result<$crate::rest::paginator::ListPage<$item>, $crate::rest::FlickrError> {
                $(
                    if let Some(container) = self.$container {
                        return Ok($crate::rest::paginator::ListPage {
                            pages: container.pages,
                            items: container
                                .items
                                .into_iter()
                                .map(|mut item| {
                                    item.client = Some(client.clone());
                                    item
                                })
                                .collect(),
                        });
                    }
                )+
                Err($crate::rest::FlickrError::Protocol(format!(
                    "list response has no {} element",
                    [$( stringify!($container) ),+].join(" or ")
                )))
            }
        }
    };
}

pub(crate) use list_envelope;
